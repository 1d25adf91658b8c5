// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Courier CLI - send a single HTTP request through the pipeline

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use reqwest::Method;

use courier::{Client, Payload};

/// Parsed command line
#[derive(Debug)]
struct Invocation {
    method: Method,
    url: String,
    data: Option<String>,
    content_type: Option<&'static str>,
    retry: u32,
    browser: bool,
    headers: Vec<String>,
    show_request: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("courier=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None => {
            print_usage();
            return ExitCode::from(1);
        }
        Some("--help" | "-h" | "help") => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Some("--version" | "-v" | "version") => {
            println!("courier {}", courier::VERSION);
            return ExitCode::SUCCESS;
        }
        Some(_) => {}
    }

    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match send(invocation).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Request failed: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Courier - Outbound HTTP Request Pipeline

USAGE:
    courier <METHOD> <url> [data] [OPTIONS]

OPTIONS:
    --json              Send data as application/json
    --xml               Send data as application/xml
    --retry <N>         Retry failed sends N times (1s apart)
    --browser           Enable browser mode (cookie capture)
    -H <name: value>    Add a request header (repeatable)
    --show-request      Print the request as sent
    help                Show this help message
    version             Show version information

EXAMPLES:
    courier GET "https://example.com/search" "q=rust"
    courier POST https://example.com/api '{{"name":"courier"}}' --json
    courier POST https://example.com/upload "title=report&file=@file:/tmp/report.pdf"
"#
    );
}

fn parse_args(args: &[String]) -> anyhow::Result<Invocation> {
    let mut positional = Vec::new();
    let mut content_type = None;
    let mut retry = 0;
    let mut browser = false;
    let mut headers = Vec::new();
    let mut show_request = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => content_type = Some("application/json"),
            "--xml" => content_type = Some("application/xml"),
            "--browser" => browser = true,
            "--show-request" => show_request = true,
            "--retry" => {
                let n = iter.next().ok_or_else(|| anyhow!("--retry needs a value"))?;
                retry = n
                    .parse()
                    .with_context(|| format!("invalid retry count '{}'", n))?;
            }
            "-H" | "--header" => {
                let header = iter.next().ok_or_else(|| anyhow!("{} needs a value", arg))?;
                headers.push(header.clone());
            }
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let method = positional
        .next()
        .ok_or_else(|| anyhow!("missing method"))?
        .to_ascii_uppercase();
    let method = Method::from_bytes(method.as_bytes())
        .with_context(|| format!("invalid method '{}'", method))?;
    let url = positional.next().ok_or_else(|| anyhow!("missing url"))?;
    let data = positional.next();
    if let Some(extra) = positional.next() {
        bail!("unexpected argument '{}'", extra);
    }

    Ok(Invocation {
        method,
        url,
        data,
        content_type,
        retry,
        browser,
        headers,
        show_request,
    })
}

async fn send(invocation: Invocation) -> anyhow::Result<bool> {
    let client = Client::new()?;
    client.set_retry(invocation.retry, Duration::from_secs(1));
    client.set_browser_mode(invocation.browser);
    for header in &invocation.headers {
        client.set_header_raw(header)?;
    }
    if let Some(content_type) = invocation.content_type {
        client.set_content_type(content_type)?;
    }

    let payload = invocation.data.map(Payload::from).unwrap_or_default();
    let response = client
        .do_request(invocation.method, &invocation.url, payload)
        .await
        .with_context(|| format!("request to {}", invocation.url))?;

    if invocation.show_request {
        println!("=== Request ===");
        println!("{}", response.raw_request());
        println!();
    }

    println!("=== Response ===");
    println!("Status: {}", response.status());
    println!("URL: {}", response.url());
    for (name, value) in response.headers() {
        println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }

    if invocation.browser {
        let cookies = client.cookies().snapshot();
        if !cookies.is_empty() {
            println!("\n=== Cookies ({}) ===", cookies.len());
            for (name, value) in &cookies {
                println!("  - {}={}", name, value);
            }
        }
    }

    let success = response.is_success();
    let body = response.text().await?;
    if !body.is_empty() {
        println!("\n{}", body);
    }
    Ok(success)
}
