use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use convnet_tensorflow::prelude::*;

pub fn handle(files: &[PathBuf]) -> Result<()> {
    let mut count = 0usize;
    for path in files {
        let file = fs_err::File::open(path)?;
        let mut in_file = 0usize;
        for (ix, payload) in RecordReader::new(BufReader::new(file)).enumerate() {
            let payload = payload.with_context(|| format!("Reading record #{ix} of {path:?}"))?;
            let record =
                decode(&payload).with_context(|| format!("Decoding record #{ix} of {path:?}"))?;
            log::debug!("{path:?} #{ix}: label {} {:?}", record.label(), record.text());
            in_file += 1;
        }
        log::info!("{path:?}: {in_file} records");
        count += in_file;
    }
    println!("{count}");
    println!("Done");
    Ok(())
}
