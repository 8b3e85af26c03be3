// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use figment::{
    Figment,
    providers::{Format, Json, Yaml},
};

mod config;
mod parse;

/// The configuration file loaded when none is given
const DEFAULT_CONFIG_PATH: &str = "msal.yaml";

#[derive(Parser, Debug)]
enum Subcommand {
    /// Configuration-related commands
    Config(self::config::Options),

    /// Parse an object and print its canonical form
    Parse(self::parse::Options),
}

/// Check the configuration and the objects of a browser identity client
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Options {
    /// Path to the configuration file
    #[arg(short, long, global = true, action = clap::ArgAction::Append)]
    config: Vec<Utf8PathBuf>,

    #[command(subcommand)]
    subcommand: Subcommand,
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as S;
        match self.subcommand {
            S::Config(c) => c.run(figment).await,
            S::Parse(c) => c.run().await,
        }
    }

    /// Get a [`Figment`] instance with the configuration loaded
    pub fn figment(&self) -> Figment {
        let configs = if self.config.is_empty() {
            vec![Utf8PathBuf::from(DEFAULT_CONFIG_PATH)]
        } else {
            self.config.clone()
        };

        configs.into_iter().fold(Figment::new(), |f, path| {
            if path.extension() == Some("json") {
                f.admerge(Json::file(path))
            } else {
                f.admerge(Yaml::file(path))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use msal_config::Configuration;

    use super::*;

    #[test]
    fn merge_config_files() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "base.yaml",
                r"
                    auth:
                      clientId: base
                      knownAuthorities:
                        - login.contoso.com
                ",
            )?;
            jail.create_file(
                "extra.json",
                r#"{ "auth": { "clientId": "extra", "knownAuthorities": ["login.fabrikam.com"] } }"#,
            )?;

            let options = Options::try_parse_from([
                "msal-cli",
                "config",
                "check",
                "-c",
                "base.yaml",
                "-c",
                "extra.json",
            ])
            .map_err(|e| e.to_string())?;

            let config = Configuration::load(&options.figment()).map_err(|e| e.to_string())?;
            assert_eq!(config.client_id(), "extra");
            assert_eq!(
                config.auth.known_authorities(),
                ["login.contoso.com".to_owned(), "login.fabrikam.com".to_owned()]
            );

            Ok(())
        });
    }

    #[test]
    fn default_config_file() {
        Jail::expect_with(|jail| {
            jail.create_file("msal.yaml", "auth:\n  clientId: default\n")?;

            let options = Options::try_parse_from(["msal-cli", "config", "check"])
                .map_err(|e| e.to_string())?;

            let config = Configuration::load(&options.figment()).map_err(|e| e.to_string())?;
            assert_eq!(config.client_id(), "default");

            Ok(())
        });
    }
}
