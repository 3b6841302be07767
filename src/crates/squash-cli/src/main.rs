//! # squash
//!
//! Command-line client for browsing a SquashTM instance through the
//! resilient access layer in `squash-client`.
//!
//! The API token comes from `SQUASH_API_TOKEN` or a configuration file; there
//! is no built-in token.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use squash_client::tree::Forest;
use squash_client::{
    CircuitStatus, ConnectionStatus, NodeId, PageRequest, SquashConfig, SquashService, TestCase,
    Token, TokenStatus, TreeNode,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use tooling::logging::{format_duration, init_tracing, timed};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "squash")]
#[command(about = "Browse SquashTM projects, folders and test cases", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); defaults to $SQUASH_CONFIG
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Answer from the built-in sample data when SquashTM is unreachable
    #[arg(long, global = true)]
    fallback: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Probe the API; exits non-zero when it does not answer
    Health,

    /// Show token, circuit breaker and connection status
    Status,

    /// Describe the API token
    Token {
        /// Use this token for the invocation instead of the configured one
        #[arg(long, value_name = "TOKEN")]
        set: Option<String>,
    },

    /// Print the project / folder / test-case tree
    Tree {
        /// Levels to expand below the projects
        #[arg(short, long, default_value_t = 2)]
        depth: usize,
    },

    /// List test cases one page at a time
    TestCases {
        /// Zero-based page number
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        /// Page size (defaults to the configured test-case page size)
        #[arg(short, long)]
        size: Option<u32>,

        /// Only test cases of this project
        #[arg(long, value_name = "ID")]
        project: Option<i64>,
    },

    /// Show one test case with its steps
    TestCase {
        /// Test case id
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    let service = SquashService::from_config(&config).context("Failed to set up the SquashTM client")?;

    match cli.command {
        Commands::Health => {
            let start = std::time::Instant::now();
            let healthy = timed("health_check", service.health_check()).await;
            let elapsed = format_duration(start.elapsed());
            if cli.json {
                print_json(&json!({ "healthy": healthy, "elapsed": elapsed }))?;
            } else if healthy {
                println!("SquashTM at {} is healthy ({})", config.base_url, elapsed);
            }
            if !healthy {
                bail!("SquashTM at {} did not answer the health check", config.base_url);
            }
        }
        Commands::Status => {
            let connection = service.connection_status().await;
            let token = service.token_status();
            let circuit = service.circuit_status();
            if cli.json {
                print_json(&json!({
                    "connection": connection,
                    "token": token,
                    "circuit": circuit,
                }))?;
            } else {
                print!("{}", render_status(connection, token.as_ref(), &circuit));
            }
        }
        Commands::Token { set } => {
            if let Some(raw) = set {
                service.replace_token(Token::new(raw));
            }
            let status = service.token_status();
            if cli.json {
                print_json(&status)?;
            } else {
                print!("{}", render_token(status.as_ref()));
            }
        }
        Commands::Tree { depth } => {
            let forest = load_tree(&service, depth).await?;
            if cli.json {
                print_json(&Value::Array(forest.iter().map(|n| node_json(n)).collect()))?;
            } else {
                print!("{}", render_tree(&forest));
            }
        }
        Commands::TestCases { page, size, project } => {
            let request = PageRequest::new(page, size.unwrap_or(config.page_sizes.test_cases));
            let listing = match project {
                Some(id) => service.api().project_test_cases(id, request).await,
                None => service.api().test_cases(request).await,
            }
            .context("Failed to list test cases")?;
            if cli.json {
                print_json(&listing)?;
            } else {
                println!(
                    "page {} ({} of {} test cases)",
                    page,
                    listing.len(),
                    listing.total_elements
                );
                for case in &listing.items {
                    println!("{}", render_row(case));
                }
            }
        }
        Commands::TestCase { id } => {
            let case = service
                .api()
                .test_case(id)
                .await
                .with_context(|| format!("Failed to fetch test case {}", id))?;
            if cli.json {
                print_json(&case)?;
            } else {
                print!("{}", render_test_case(&case));
            }
        }
    }

    Ok(())
}

/// Defaults, file and environment first, then command-line overrides.
fn build_config(cli: &Cli) -> Result<SquashConfig> {
    let mut config = SquashConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if cli.fallback {
        config.fallback_enabled = true;
    }
    // `token --set` works without a configured token
    if let Commands::Token { set: Some(raw) } = &cli.command {
        if config.token.is_none() {
            config.token = Some(Token::new(raw.clone()));
        }
    }
    config.validate()?;
    Ok(config)
}

/// Load the roots, then expand `depth` levels breadth-first.
async fn load_tree(service: &SquashService, depth: usize) -> Result<Forest> {
    let roots = service.load_roots().await.context("Failed to list projects")?;
    let mut level: Vec<NodeId> = roots.iter().map(|n| n.id).collect();

    for _ in 0..depth {
        if level.is_empty() {
            break;
        }
        let results = service.tree().expand_all(&level).await;
        let mut next = Vec::new();
        for (id, result) in level.iter().zip(results) {
            match result {
                Ok(node) => next.extend(
                    node.children
                        .iter()
                        .flatten()
                        .filter(|child| !child.is_leaf())
                        .map(|child| child.id),
                ),
                Err(err) => warn!(node = %id, error = %err, "Could not expand node"),
            }
        }
        level = next;
    }

    Ok(service.snapshot())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Wire name of an enum value, e.g. `VERY_HIGH`.
fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        _ => String::from("?"),
    }
}

fn render_token(status: Option<&TokenStatus>) -> String {
    let Some(status) = status else {
        return String::from("token: undecodable (treated as expired)\n");
    };
    let mut out = String::new();
    let _ = writeln!(out, "subject:     {}", status.subject.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "permissions: {}", status.permissions.as_deref().unwrap_or("-"));
    if let Some(issued) = status.issued_at {
        let _ = writeln!(out, "issued at:   {}", issued.to_rfc3339());
    }
    let _ = writeln!(
        out,
        "expires at:  {} ({})",
        status.expires_at.to_rfc3339(),
        if status.is_expired { "expired" } else { "valid" }
    );
    out
}

fn render_status(connection: ConnectionStatus, token: Option<&TokenStatus>, circuit: &CircuitStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "connection:  {}", connection);
    let breaker = if circuit.is_open {
        format!("open, {} left", format_duration(circuit.cooldown_remaining))
    } else {
        String::from("closed")
    };
    let _ = writeln!(
        out,
        "circuit:     {} ({}/{} failures)",
        breaker, circuit.failures, circuit.threshold
    );
    out.push_str(&render_token(token));
    out
}

fn render_tree(forest: &[std::sync::Arc<TreeNode>]) -> String {
    let mut out = String::new();
    render_nodes(forest, 0, &mut out);
    out
}

fn render_nodes(nodes: &[std::sync::Arc<TreeNode>], depth: usize, out: &mut String) {
    for node in nodes {
        let marker = if node.is_leaf() {
            "-"
        } else if node.expanded {
            "v"
        } else if node.has_children {
            ">"
        } else {
            " "
        };
        let _ = write!(out, "{}{} {} [{}]", "  ".repeat(depth), marker, node.name, node.id);
        if let Some(case) = &node.test_case {
            if let Some(reference) = &case.reference {
                let _ = write!(out, " {}", reference);
            }
            if let Some(importance) = &case.importance {
                let _ = write!(out, " {}", wire_name(importance));
            }
        }
        out.push('\n');

        if node.expanded {
            if let Some(children) = &node.children {
                render_nodes(children, depth + 1, out);
            }
        }
    }
}

fn node_json(node: &TreeNode) -> Value {
    json!({
        "id": node.id.to_string(),
        "name": node.name,
        "path": node.path,
        "hasChildren": node.has_children,
        "testCase": node.test_case,
        "children": node
            .children
            .as_ref()
            .map(|children| children.iter().map(|c| node_json(c)).collect::<Vec<_>>()),
    })
}

fn render_row(case: &TestCase) -> String {
    format!(
        "{:>8}  {:<10}  {:<9}  {:<15}  {}",
        case.id,
        case.reference.as_deref().unwrap_or("-"),
        case.importance.as_ref().map(wire_name).unwrap_or_else(|| "-".into()),
        case.status.as_ref().map(wire_name).unwrap_or_else(|| "-".into()),
        case.name
    )
}

fn render_test_case(case: &TestCase) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", case.reference.as_deref().unwrap_or("-"), case.name);
    if let Some(importance) = &case.importance {
        let _ = writeln!(out, "importance:   {}", wire_name(importance));
    }
    if let Some(status) = &case.status {
        let _ = writeln!(out, "status:       {}", wire_name(status));
    }
    if let Some(folder) = &case.folder {
        let _ = writeln!(out, "folder:       {}", folder.name);
    }
    if let Some(prerequisite) = &case.prerequisite {
        let _ = writeln!(out, "prerequisite: {}", prerequisite);
    }
    if let Some(description) = &case.description {
        let _ = writeln!(out, "description:  {}", description);
    }
    for step in &case.steps {
        let _ = writeln!(out, "  {}. {} => {}", step.index, step.action, step.expected_result);
    }
    out
}
