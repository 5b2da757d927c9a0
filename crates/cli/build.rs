use std::{env, fs, path::PathBuf};

use clap_complete::shells::{Bash, Fish, PowerShell, Zsh};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("pith")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract article content and metadata from saved HTML pages")
        .arg(clap::arg!(<INPUT> "Local HTML file, or '-' for stdin"))
        .arg(clap::arg!(-u --url <URL> "URL the page was retrieved from"))
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, html, text, markdown)")
                .default_value("json")
                .value_parser(["json", "html", "text", "markdown"]),
        )
        .arg(clap::arg!(--"no-fallback" "Trust custom extractors without filling gaps from generic extraction"))
        .arg(
            clap::arg!(--extractors <DIR> "Directory of custom extractor definitions")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(clap::arg!(--timeout <SECS> "Cancel extraction after this many seconds"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(Bash, &mut cmd, "pith", &completions_dir).unwrap();
    clap_complete::generate_to(Zsh, &mut cmd, "pith", &completions_dir).unwrap();
    clap_complete::generate_to(Fish, &mut cmd, "pith", &completions_dir).unwrap();
    clap_complete::generate_to(PowerShell, &mut cmd, "pith", &completions_dir).unwrap();
}
