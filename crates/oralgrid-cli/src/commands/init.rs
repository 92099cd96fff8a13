//! The `oralgrid init` command.

use std::path::Path;

use anyhow::Result;

use oralgrid_core::catalog::Catalog;

pub fn execute() -> Result<()> {
    if Path::new("oralgrid.toml").exists() {
        println!("oralgrid.toml already exists, skipping.");
    } else {
        std::fs::write("oralgrid.toml", SAMPLE_CONFIG)?;
        println!("Created oralgrid.toml");
    }

    let catalog_path = Path::new("catalog.toml");
    if catalog_path.exists() {
        println!("catalog.toml already exists, skipping.");
    } else {
        std::fs::write(catalog_path, Catalog::builtin().to_toml_string()?)?;
        println!("Created catalog.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust the criteria in catalog.toml");
    println!("  2. Run: oralgrid validate --catalog catalog.toml");
    println!("  3. Run: oralgrid session");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# oralgrid configuration

# Criteria grid; remove this line to use the built-in grid.
catalog = "catalog.toml"

# Answer assumed when a status prompt is left empty: "unset", "satisfied" or "unsatisfied".
default_status = "unset"

# Where `export` and `html` write their files.
output_dir = "."

# Seconds a `clear` request waits for its confirmation.
confirm_ttl_secs = 30

# Export layout: "structured" or "legacy".
export_layout = "structured"
ascii_only = false
"#;
