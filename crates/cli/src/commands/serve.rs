//! Metadata server stub
//!
//! The serving API is a separate component that reads the catalog tables
//! once the schema is stable; it never touches the migration ledger.

use anyhow::Result;

pub fn run(port: u16) -> Result<()> {
    // TODO: serve the catalog API once the read layer lands.
    println!("TODO: Serve on port {port}");
    Ok(())
}
