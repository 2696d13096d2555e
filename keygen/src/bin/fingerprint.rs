//! DentaDesk device fingerprint tool
//!
//! Prints this machine's device id for the customer to send to the operator,
//! and optionally checks a license key against it.
//!
//! Usage:
//!   dentadesk-fingerprint
//!   dentadesk-fingerprint --check XXXXX-XXXXX-XXXXX-XXXXX --tier STANDARD --region GLOBAL

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dentadesk_keygen::{init_logging, FingerprintReport};
use dentadesk_license::{DeviceFingerprint, Entitlement, LicenseError, Validator};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "dentadesk-fingerprint")]
#[command(about = "Show this machine's DentaDesk device id and check license keys")]
struct Args {
    /// License key to validate on this machine
    #[arg(long, requires_all = ["tier", "region"])]
    check: Option<String>,

    /// Tier the key was issued for
    #[arg(long)]
    tier: Option<String>,

    /// Region the key was issued for
    #[arg(long)]
    region: Option<String>,

    /// Expiry the key was issued with (YYYY-MM-DD)
    #[arg(long)]
    expires: Option<NaiveDate>,

    /// Print the fingerprint as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let fingerprint = DeviceFingerprint::generate().context("failed to fingerprint this machine")?;
    let report = FingerprintReport::from(&fingerprint);

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{json}");
    } else {
        print!("{}", report.render_text());
    }

    let (Some(key), Some(tier), Some(region)) = (args.check, args.tier, args.region) else {
        return Ok(());
    };

    let mut claimed = Entitlement::parse(&tier, &region)?;
    if let Some(date) = args.expires {
        claimed = claimed.with_expiry(date);
    }

    match Validator::new().validate(&key, &claimed) {
        Ok(entitlement) => {
            println!(
                "License:   VALID ({} / {})",
                entitlement.tier(),
                entitlement.region()
            );
            Ok(())
        }
        Err(LicenseError::Expired(date)) => {
            warn!(%date, "license key matched but has expired");
            bail!("license expired on {date}")
        }
        Err(e) => bail!("license check failed: {e}"),
    }
}
