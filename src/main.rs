// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Sizzle CLI - query HTML files with CSS selectors

use std::env;
use std::process::ExitCode;

use anyhow::Context;
use serde::Serialize;

use sizzle::{parse_html_file, Engine, Node};

/// One matched element, printed as a JSON line
#[derive(Debug, Serialize)]
struct MatchRecord {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    text: String,
    html: String,
}

impl MatchRecord {
    fn from_node(node: &Node) -> Self {
        Self {
            tag: node.local_name(),
            id: node.get_attribute("id"),
            classes: node.class_list(),
            text: node.text_content().trim().to_string(),
            html: node.outer_html(),
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sizzle=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "select" => {
            if args.len() < 4 {
                eprintln!("Usage: sizzle select <selector> <file.html>");
                return ExitCode::from(1);
            }
            select(&args[2], &args[3])
        }
        "tokens" => {
            if args.len() < 3 {
                eprintln!("Usage: sizzle tokens <selector>");
                return ExitCode::from(1);
            }
            tokens(&args[2])
        }
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("sizzle {}", sizzle::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r##"Sizzle - CSS Selector Engine

USAGE:
    sizzle <COMMAND> [OPTIONS]

COMMANDS:
    select <selector> <file>    Print elements of an HTML file matching a selector
    tokens <selector>           Print the token groups of a selector
    help                        Show this help message
    version                     Show version information

EXAMPLES:
    sizzle select "#list > li:nth-child(2)" page.html
    sizzle select "form :input:not(:disabled)" login.html
    sizzle tokens "div.a > p:first, span[lang|=en]"

Set RUST_LOG=sizzle=debug to trace compilation and cache activity.
"##
    );
}

fn select(selector: &str, path: &str) -> anyhow::Result<()> {
    let doc = parse_html_file(path).with_context(|| format!("Failed to load {}", path))?;
    let found = doc
        .select(selector)
        .with_context(|| format!("Failed to evaluate {:?}", selector))?;

    for node in &found {
        println!("{}", serde_json::to_string(&MatchRecord::from_node(node))?);
    }

    tracing::info!(selector = %selector, matches = found.len(), "Selection complete");
    Ok(())
}

fn tokens(selector: &str) -> anyhow::Result<()> {
    let engine = Engine::default();
    let groups = engine.tokenize(selector)?;
    println!("{}", serde_json::to_string_pretty(&groups)?);
    Ok(())
}
