//! implant params command - print the default parameter set.

use anyhow::{Context, Result};
use implant_mesh::ImplantParams;

use crate::{Cli, OutputFormat};

/// Render the defaults as TOML, or JSON when asked for.
fn render(json: bool) -> Result<String> {
    let params = ImplantParams::default();
    let text = if json {
        params.to_json_string()
    } else {
        params.to_toml_string()
    };
    text.context("Failed to serialize default parameters")
}

pub fn run(json: bool, cli: &Cli) -> Result<()> {
    if cli.quiet {
        return Ok(());
    }
    let json = json || matches!(cli.format, OutputFormat::Json);
    println!("{}", render(json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_defaults_parse_back() {
        let toml = render(false).unwrap();
        assert!(toml.contains("total_length"));
        assert_eq!(
            ImplantParams::from_toml_str(&toml).unwrap(),
            ImplantParams::default()
        );

        let json = render(true).unwrap();
        assert_eq!(
            ImplantParams::from_json_str(&json).unwrap(),
            ImplantParams::default()
        );
    }
}
