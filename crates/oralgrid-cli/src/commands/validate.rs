//! The `oralgrid validate` command.

use std::path::PathBuf;

use anyhow::Result;

use oralgrid_core::catalog::{validate_catalog, Catalog};

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let catalog = Catalog::load(&catalog_path)?;

    println!(
        "Catalog: {} ({} categories, {} criteria)",
        catalog.title,
        catalog.categories.len(),
        catalog.len()
    );
    for category in &catalog.categories {
        println!("  {}: {} criteria", category.name, category.criteria.len());
    }

    let warnings = validate_catalog(&catalog);
    for w in &warnings {
        let prefix = w
            .category
            .as_ref()
            .map(|name| format!("  [{name}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Catalog valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
