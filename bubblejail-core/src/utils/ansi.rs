/*
 * bubblejail-core
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use nix::unistd::isatty;

use crate::constants::IS_COLOR_TERMINAL;

pub fn is_color_terminal() -> bool {
    isatty(0).is_ok() && isatty(1).is_ok()
}

pub fn bold_red() -> &'static str {
    match *IS_COLOR_TERMINAL {
        true => "\x1b[1;31m",
        false => "",
    }
}

pub fn bold_yellow() -> &'static str {
    match *IS_COLOR_TERMINAL {
        true => "\x1b[1;33m",
        false => "",
    }
}

pub fn bold_green() -> &'static str {
    match *IS_COLOR_TERMINAL {
        true => "\x1b[1;32m",
        false => "",
    }
}

pub fn bold() -> &'static str {
    match *IS_COLOR_TERMINAL {
        true => "\x1b[1m",
        false => "",
    }
}

pub fn reset() -> &'static str {
    match *IS_COLOR_TERMINAL {
        true => "\x1b[0m",
        false => "",
    }
}

pub fn dim() -> &'static str {
    match *IS_COLOR_TERMINAL {
        true => "\x1b[2m",
        false => "",
    }
}
