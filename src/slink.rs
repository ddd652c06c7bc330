extern crate clap;
use clap::*;

mod cmd_slink;

fn main() -> anyhow::Result<()> {
    let app = Command::new("slink")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`slink` - Single-linkage clustering of distance matrices")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase logging verbosity (-v info, -vv debug)"),
        )
        .subcommand(cmd_slink::check::make_subcommand())
        .subcommand(cmd_slink::nearest::make_subcommand())
        .subcommand(cmd_slink::cluster::make_subcommand())
        .subcommand(cmd_slink::corr::make_subcommand())
        .subcommand(cmd_slink::heatmap::make_subcommand())
        .subcommand(cmd_slink::marker::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Distance matrices:
    * check   - Validate a distance matrix
    * nearest - Distance between two items
    * cluster - Single-linkage clustering

* Heatmaps:
    * corr    - Correlation distances between traits
    * heatmap - Cluster and order traits
    * marker  - Nearest marker of each trait

Matrices are read as relaxed PHYLIP, or as JSON nested arrays with --json.
Set RUST_LOG to override the logging level.

"###,
        );

    let matches = app.get_matches();

    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    // Check which subcomamnd the user ran...
    match matches.subcommand() {
        Some(("check", sub_matches)) => cmd_slink::check::execute(sub_matches),
        Some(("nearest", sub_matches)) => cmd_slink::nearest::execute(sub_matches),
        Some(("cluster", sub_matches)) => cmd_slink::cluster::execute(sub_matches),
        Some(("corr", sub_matches)) => cmd_slink::corr::execute(sub_matches),
        Some(("heatmap", sub_matches)) => cmd_slink::heatmap::execute(sub_matches),
        Some(("marker", sub_matches)) => cmd_slink::marker::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
