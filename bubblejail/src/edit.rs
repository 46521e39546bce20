/*
 * bubblejail
 *
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    fs::{copy, remove_file, File},
    io::copy as copy_io,
    process::Command,
};

use bubblejail_core::{
    config::store::Instance,
    constants::EDITOR,
    err,
    error,
    utils::{arguments::Operand, Arguments},
    ErrorGeneric,
    ErrorKind,
    Result,
};
use rand::distributions::{Alphanumeric, DistString};
use sha2::{Digest, Sha256};

pub fn edit(args: &mut Arguments) -> Result<()> {
    let name = match args.next().unwrap_or_default() {
        Operand::Value(val) => val,
        _ => return args.invalid_operand(),
    };
    let instance = Instance::load(name)?;
    let lock = instance.lock().lock()?;
    let result = edit_services_file(&instance);

    lock.unlock()?;
    result
}

fn edit_services_file(instance: &Instance) -> Result<()> {
    let path = instance.services_path();
    let suffix = Alphanumeric.sample_string(&mut rand::thread_rng(), 10);
    let temp = format!("/tmp/bubblejail.{}.toml", suffix);

    copy(&path, &temp).prepend_io(|| path.display().to_string())?;

    let status = Command::new(*EDITOR)
        .arg(&temp)
        .spawn()
        .map_err(|e| error!(ErrorKind::ProcessInitFailure(*EDITOR, e.kind())))?
        .wait()
        .map_err(|e| error!(ErrorKind::ProcessWaitFailure(*EDITOR, e.kind())))?;

    if !status.success() {
        remove_file(&temp).prepend_io(|| temp.clone())?;
        err!(ErrorKind::Message("Editor exited with a non-zero status; no changes written."))?
    }

    if hash_file(&path)? != hash_file(std::path::Path::new(&temp))? {
        copy(&temp, &path).prepend_io(|| temp.clone())?;
        eprintln!("Changes written to '{}'.", path.display());
    } else {
        eprintln!("No changes made.");
    }

    remove_file(&temp).prepend_io(|| temp)
}

fn hash_file(path: &std::path::Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).prepend_io(|| path.display().to_string())?;
    let mut hasher = Sha256::new();

    copy_io(&mut file, &mut hasher).prepend_io(|| path.display().to_string())?;
    Ok(hasher.finalize().to_vec())
}
