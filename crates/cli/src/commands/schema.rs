//! `assetwright schema` — Show the fields of a domain.

use assetwright_core::Domain;
use assetwright_engine::lookup;

pub fn run(domain: Domain) {
    let schema = lookup(domain);

    println!("📋 {} (schema v{})", schema.domain, schema.version);
    println!("   {}", schema.description);
    println!("   Default merge policy: {}", domain.default_policy());
    println!("   Unset marker: \"{}\"\n", schema.sentinel);

    for field in schema.fields {
        println!("  {}", field.name);
        println!("      {}", field.kind.describe());
        println!("      default: {}", field.default_value());
    }

    if !schema.rules.is_empty() {
        println!("\n  Rules:");
        for rule in schema.rules {
            println!("    - {}", rule.describe());
        }
    }
}
