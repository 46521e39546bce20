use std::{env::var, process::Command};

fn head() -> String {
    match Command::new("git").args(["rev-parse", "--short", "HEAD"]).output() {
        Ok(output) => String::from_utf8(output.stdout).unwrap_or("N/A".into()).trim().to_string(),
        Err(_) => "N/A".into(),
    }
}

fn time() -> String {
    match Command::new("date").arg("+%d-%m-%Y").output() {
        Ok(output) => String::from_utf8(output.stdout).unwrap_or("N/A".into()).trim().to_string(),
        Err(_) => "N/A".into(),
    }
}

fn release() -> &'static str {
    match var("DEBUG").map(|d| d.parse().unwrap_or(true)).unwrap_or(true) {
        true => "DEV",
        false => "RELEASE",
    }
}

fn main() {
    println!("cargo:rustc-env=BUBBLEJAIL_BUILDSTAMP={}", head());
    println!("cargo:rustc-env=BUBBLEJAIL_BUILDTIME={}", time());
    println!("cargo:rustc-env=BUBBLEJAIL_BUILD={}", release());
}
