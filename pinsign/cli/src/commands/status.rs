use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use pinsign_core::Custodian;

use super::report;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/**
    Show whether a removable drive is attached.
*/
#[derive(Args)]
pub struct StatusCommand {
    /// Keep polling and print every change until interrupted.
    #[arg(short, long)]
    watch: bool,
}

impl StatusCommand {
    pub fn run(self, custodian: &Custodian) -> Result<()> {
        let mut last = custodian.status().map_err(report)?;
        println!("{last}");
        if !self.watch {
            return Ok(());
        }

        loop {
            thread::sleep(POLL_INTERVAL);
            let current = custodian.status().map_err(report)?;
            if current != last {
                println!("{current}");
                last = current;
            }
        }
    }
}

/**
    List removable volumes and the keys they carry.
*/
#[derive(Args)]
pub struct VolumesCommand {}

impl VolumesCommand {
    pub fn run(self, custodian: &Custodian) -> Result<()> {
        let storage = custodian.storage();
        let volumes = storage.enumerate().map_err(report)?;
        if volumes.is_empty() {
            println!("No removable drives detected.");
            return Ok(());
        }

        let keys = storage.find_encrypted_keys(&volumes);
        for volume in &volumes {
            let marker = if keys.iter().any(|k| k.parent() == Some(volume.path())) {
                "key"
            } else {
                "-"
            };
            println!("{marker:<4} {}", volume.path().display());
        }
        Ok(())
    }
}
