/*
 * bubblejail
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use bubblejail_core::utils::arguments::{Arguments, Operand as Op};

mod complete;
mod create;
mod desktop;
mod edit;
mod list;
mod manual;
mod run;

fn main() {
    let arguments = &mut Arguments::new().populate();
    let result = match arguments.next().unwrap_or_default() {
        Op::Value("create") => create::create(arguments),
        Op::Value("run") | Op::Value("shell") => run::run(arguments),
        Op::Value("list") => list::list(arguments),
        Op::Value("edit") => edit::edit(arguments),
        Op::Value("generate-desktop-entry") => desktop::generate(arguments),
        Op::Value("auto-complete") => complete::complete(arguments),
        Op::Short('h') | Op::Long("help") | Op::Value("help") => manual::help(),
        Op::Short('V') | Op::Long("version") | Op::Value("version") => manual::print_version(),
        _ => arguments.invalid_operand(),
    };

    if let Err(error) = result {
        error.handle();
    }
}
