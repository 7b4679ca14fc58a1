// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[
    clap(
        name = "kubedb-defaulter",
        version,
        author,
        about = "Default, validate and inspect KubeDB database manifests"
    )
]
pub struct CliArgs {
    /// Configuration file, YAML or JSON
    #[clap(long, global = true, env = "KUBEDB_CONFIG_FILE")]
    pub config: Option<String>,
    #[clap(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Manifest to read, `-` for stdin
    #[clap(long, short = 'f', default_value = "-")]
    pub file: String,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Version catalog file, overrides `defaulter.catalog_file`
    #[clap(long)]
    pub catalog: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[
        clap(
            name = "default",
            about = "Fill the unset fields of a manifest and print it"
        )
    ]
    Default {
        #[clap(flatten)]
        manifest: ManifestArgs,
        #[clap(flatten)]
        catalog: CatalogArgs,
        /// Output format, `yaml` or `json`
        #[clap(long, short = 'o')]
        output: Option<String>,
    },
    #[
        clap(
            name = "validate",
            about = "Validate a manifest for creation, update or deletion"
        )
    ]
    Validate {
        #[clap(flatten)]
        manifest: ManifestArgs,
        #[clap(flatten)]
        catalog: CatalogArgs,
        /// Check whether the database may be deleted instead
        #[clap(long)]
        delete: bool,
    },
    #[
        clap(
            name = "names",
            about = "Print the names and labels derived from a manifest"
        )
    ]
    Names {
        #[clap(flatten)]
        manifest: ManifestArgs,
    },
    #[
        clap(
            name = "ready",
            about = "Check the readiness of a database against a list of workloads"
        )
    ]
    Ready {
        #[clap(flatten)]
        manifest: ManifestArgs,
        /// File holding the StatefulSets of the namespace, as a list or a `List` object
        #[clap(long, short = 'w')]
        workloads: String,
    },
    #[
        clap(
            name = "hash",
            about = "Print a stable hash of a manifest"
        )
    ]
    Hash {
        #[clap(flatten)]
        manifest: ManifestArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcommands() {
        let args = CliArgs::try_parse_from(["kubedb-defaulter", "names", "-f", "db.yaml"]).unwrap();
        assert!(matches!(args.cmd, Some(Commands::Names { ref manifest }) if manifest.file == "db.yaml"));

        let args = CliArgs::try_parse_from(["kubedb-defaulter", "validate", "--delete"]).unwrap();
        assert!(matches!(args.cmd, Some(Commands::Validate { delete: true, .. })));

        assert!(CliArgs::try_parse_from(["kubedb-defaulter", "crds"]).is_err());
    }
}
