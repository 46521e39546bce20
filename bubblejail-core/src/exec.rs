/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

pub mod dbus_proxy;
pub mod namespaces;
pub mod protocol;
pub mod runner;
pub mod seccomp;
