/*
 * bubblejail
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use bubblejail_core::{
    config::store::Instance,
    utils::{arguments::Operand, Arguments},
    Result,
};

const SUBCOMMANDS: &[&str] = &["create", "run", "shell", "list", "edit", "generate-desktop-entry", "auto-complete", "help"];
const LIST_TARGETS: &[&str] = &["instances", "profiles", "services"];

/// `auto-complete COMP_LINE` — print newline-separated candidates for the word being
/// completed. The bash/fish wrapper scripts that call this (outside this crate's scope)
/// hand the full command line as a single positional argument and render our stdout back
/// into COMPREPLY; we never touch the user's terminal directly.
pub fn complete(args: &mut Arguments) -> Result<()> {
    let line = match args.next() {
        Some(Operand::Value(line)) => line,
        _ => "",
    };
    let words: Vec<&str> = line.split_whitespace().collect();
    // words[0] is the program name itself ("bubblejail"), already consumed by the caller.
    let trailing_space = line.ends_with(char::is_whitespace);
    let args_only = words.get(1 ..).unwrap_or_default();

    for candidate in candidates(args_only, trailing_space) {
        println!("{candidate}");
    }
    Ok(())
}

fn candidates(words: &[&str], trailing_space: bool) -> Vec<String> {
    if words.is_empty() || (words.len() == 1 && !trailing_space) {
        let prefix = words.first().copied().unwrap_or("");
        return filter(SUBCOMMANDS, prefix);
    }

    let (sub, rest) = words.split_first().expect("non-empty words");
    let (word, prefix) = match rest.last() {
        Some(last) if !trailing_space => (rest.len() - 1, *last),
        _ => (rest.len(), ""),
    };
    let rest = &rest[.. word];

    match *sub {
        "run" | "shell" | "edit" => complete_instance(rest, prefix),
        "list" => filter(LIST_TARGETS, prefix),
        "generate-desktop-entry" => complete_instance(rest, prefix),
        "create" => complete_flag(rest, prefix, &["--profile", "--no-desktop-entry"]),
        _ => Vec::new(),
    }
}

fn complete_instance(rest: &[&str], prefix: &str) -> Vec<String> {
    if rest.iter().any(|w| !w.starts_with('-')) {
        return Vec::new();
    }

    match Instance::list() {
        Ok(names) => filter(&names.iter().map(String::as_str).collect::<Vec<_>>(), prefix),
        Err(_) => Vec::new(),
    }
}

fn complete_flag(rest: &[&str], prefix: &str, flags: &[&str]) -> Vec<String> {
    if !rest.is_empty() {
        return Vec::new();
    }
    filter(flags, prefix)
}

fn filter(candidates: &[&str], prefix: &str) -> Vec<String> {
    candidates.iter().filter(|c| c.starts_with(prefix)).map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_subcommands_by_prefix() {
        let out = candidates(&["r"], false);
        assert_eq!(out, vec!["run".to_string()]);
    }

    #[test]
    fn completes_all_subcommands_when_empty() {
        let out = candidates(&[], false);
        assert_eq!(out.len(), SUBCOMMANDS.len());
    }

    #[test]
    fn completes_list_targets() {
        let out = candidates(&["list", ""], true);
        assert_eq!(out, LIST_TARGETS.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn completes_create_flags() {
        let out = candidates(&["create", "--p"], false);
        assert_eq!(out, vec!["--profile".to_string()]);
    }

    #[test]
    fn no_flag_completion_after_positional() {
        let out = complete_flag(&["myinstance"], "--", &["--profile"]);
        assert!(out.is_empty());
    }
}
