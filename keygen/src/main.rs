//! DentaDesk license key generator
//!
//! Operator tool that derives the license key for a customer's device id.
//!
//! Usage:
//!   dentadesk-keygen 40677b86a3f4d164d1d5e8f9a2b3c4d5 STANDARD GLOBAL
//!   dentadesk-keygen <DEVICE_ID> ENTERPRISE UAE --expires 2026-12-31 --json
//!
//! Exits non-zero, with the reason on stderr, whenever no key was produced.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dentadesk_keygen::{generate, init_logging};

#[derive(Parser, Debug)]
#[command(name = "dentadesk-keygen")]
#[command(about = "Generate a DentaDesk license key for a device")]
struct Args {
    /// Device id reported by the product (32 lowercase hex characters)
    device_id: String,

    /// License tier: STANDARD, PROFESSIONAL, ENTERPRISE, PREMIUM or ULTIMATE
    tier: String,

    /// Region: GLOBAL, SAUDI, UAE, KUWAIT, QATAR, BAHRAIN, OMAN, GCC or MENA
    region: String,

    /// Last day the license is valid (YYYY-MM-DD); omit for perpetual
    #[arg(long)]
    expires: Option<NaiveDate>,

    /// Print the result as JSON instead of a text report
    #[arg(long)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let report = generate(&args.device_id, &args.tier, &args.region, args.expires)
        .context("failed to generate license key")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{json}");
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
