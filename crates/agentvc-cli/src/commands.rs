use std::io::Read;
use std::net::SocketAddr;

use agentvc_sdk::{CardDiff, LoginProof, Repository, Status, MAIN_BRANCH};
use agentvc_server::{AgentvcServer, ServerConfig};
use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let open = || Repository::discover(&cli.repo);
    match cli.command {
        Command::Init(args) => cmd_init(args.path.unwrap_or_else(|| cli.repo.clone())),
        Command::Serve(args) => cmd_serve(args).await,
        Command::Status => cmd_status(&open()?, &format),
        Command::Commit(args) => cmd_commit(&open()?, args),
        Command::Log(args) => cmd_log(&open()?, args, &format),
        Command::Diff(args) => cmd_diff(&open()?, args, &format),
        Command::Branch(args) => cmd_branch(&open()?, args),
        Command::Checkout(args) => {
            open()?.checkout(&args.branch)?;
            println!("Switched to branch {}", args.branch.yellow().bold());
            Ok(())
        }
        Command::Remote(args) => cmd_remote(&mut open()?, args),
        Command::Push(args) => cmd_push(&open()?, args, &format).await,
        Command::RemoteBranches(args) => cmd_remote_branches(&open()?, args, &format).await,
        Command::DeleteRemote(args) => {
            open()?
                .delete_remote_branch(&args.remote.remote, &args.branch)
                .await?;
            println!(
                "Deleted {}/{}",
                args.remote.remote.bold(),
                args.branch.yellow()
            );
            Ok(())
        }
        Command::Fetch(args) => {
            let card = open()?
                .fetch_card(&args.remote.remote, &args.branch)
                .await?;
            print_json(&card)
        }
        Command::Whoami => cmd_whoami(&open()?, &format),
        Command::SignLogin(args) => print_json(&open()?.sign_login(&args.domain)?),
        Command::VerifyLogin(args) => cmd_verify_login(&open()?, args).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(path: std::path::PathBuf) -> anyhow::Result<()> {
    let repo = Repository::init(&path)?;
    println!(
        "{} Initialized agentvc repository in {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    println!("  Agent ID: {}", repo.agent_id().to_string().cyan());
    println!("  Card:     {}", repo.card_path().display());
    println!("  Branch:   {}", MAIN_BRANCH.yellow());
    Ok(())
}

fn cmd_status(repo: &Repository, format: &OutputFormat) -> anyhow::Result<()> {
    let status = repo.status()?;
    if matches!(format, OutputFormat::Json) {
        return print_json(&StatusJson::from(&status));
    }
    println!("On branch {}", status.branch.yellow().bold());
    println!("Agent ID: {}", status.agent_id.to_string().cyan());
    println!();
    for b in &status.branches {
        let marker = if b.current { "*" } else { " " };
        let ahead = if b.ahead > 0 {
            format!("{} unpushed", b.ahead).yellow().to_string()
        } else {
            "up to date".green().to_string()
        };
        println!("{marker} {} {} ({ahead})", b.name, b.tip.short_hex().dimmed());
    }
    println!();
    if status.is_clean() {
        println!("Working card clean.");
    } else {
        println!("Uncommitted changes:");
        print_diff(&status.changes);
        if !status.changes.changed() {
            println!("  {}", "(extension fields only)".dimmed());
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusJson<'a> {
    branch: &'a str,
    agent_id: String,
    public_key: &'a str,
    clean: bool,
    changes: &'a CardDiff,
    branches: Vec<BranchJson<'a>>,
}

#[derive(Serialize)]
struct BranchJson<'a> {
    name: &'a str,
    tip: String,
    current: bool,
    ahead: usize,
}

impl<'a> From<&'a Status> for StatusJson<'a> {
    fn from(s: &'a Status) -> Self {
        Self {
            branch: &s.branch,
            agent_id: s.agent_id.to_string(),
            public_key: &s.public_key,
            clean: s.is_clean(),
            changes: &s.changes,
            branches: s
                .branches
                .iter()
                .map(|b| BranchJson {
                    name: &b.name,
                    tip: b.tip.to_hex(),
                    current: b.current,
                    ahead: b.ahead,
                })
                .collect(),
        }
    }
}

fn cmd_commit(repo: &Repository, args: CommitArgs) -> anyhow::Result<()> {
    let id = repo.commit(&args.message)?;
    let branch = repo.current_branch()?;
    println!(
        "[{} {}] {}",
        branch.yellow(),
        id.short_hex().dimmed(),
        args.message
    );
    Ok(())
}

fn cmd_log(repo: &Repository, args: LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let entries = repo.log(args.limit)?;
    if matches!(format, OutputFormat::Json) {
        return print_json(&entries);
    }
    for entry in &entries {
        if args.oneline {
            println!("{} {}", entry.id.short_hex().yellow(), entry.commit.summary());
            continue;
        }
        println!("{} {}", "commit".yellow(), entry.id.to_hex().yellow());
        println!("Author: {}", entry.commit.author);
        println!("Date:   {}", entry.commit.timestamp);
        println!();
        for line in entry.commit.message.lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}

fn cmd_diff(repo: &Repository, args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let diff = repo.diff(args.target.as_deref())?;
    if matches!(format, OutputFormat::Json) {
        return print_json(&diff);
    }
    if diff.changed() {
        print_diff(&diff);
    } else {
        println!("No changes.");
    }
    Ok(())
}

fn print_diff(diff: &CardDiff) {
    for change in &diff.fields {
        println!(
            "  {} {}: {} → {}",
            "~".yellow(),
            change.field.bold(),
            change.old.to_string().red(),
            change.new.to_string().green()
        );
    }
    for skill in &diff.skills_added {
        println!("  {} skill {}", "+".green(), skill.id.green());
    }
    for skill in &diff.skills_removed {
        println!("  {} skill {}", "-".red(), skill.id.red());
    }
    for skill in &diff.skills_modified {
        println!("  {} skill {}", "~".yellow(), skill.id.yellow());
    }
}

fn cmd_branch(repo: &Repository, args: BranchArgs) -> anyhow::Result<()> {
    match (args.name, args.delete) {
        (Some(name), true) => {
            repo.delete_branch(&name)?;
            println!("Deleted branch {}", name.yellow());
        }
        (Some(name), false) => {
            let at = repo.create_branch(&name)?;
            println!("Created branch {} at {}", name.yellow(), at.short_hex().dimmed());
        }
        (None, true) => anyhow::bail!("branch name required with -d"),
        (None, false) => {
            let current = repo.current_branch()?;
            for (name, _) in repo.list_branches()? {
                if name == current {
                    println!("* {}", name.green().bold());
                } else {
                    println!("  {name}");
                }
            }
        }
    }
    Ok(())
}

fn cmd_remote(repo: &mut Repository, args: RemoteArgs) -> anyhow::Result<()> {
    match args.action {
        Some(RemoteAction::Add {
            name,
            url,
            card_url,
        }) => {
            repo.add_remote(&name, &url, card_url.as_deref())?;
            println!("Added remote {} → {}", name.bold(), url.blue());
        }
        None => {
            if repo.config().remotes.is_empty() {
                println!("No remotes configured.");
            }
            for (name, remote) in &repo.config().remotes {
                println!("{}\t{}", name.bold(), remote.url);
            }
        }
    }
    Ok(())
}

async fn cmd_push(repo: &Repository, args: PushArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let outcomes = repo
        .push(&args.remote.remote, args.branch.as_deref())
        .await?;
    if matches!(format, OutputFormat::Json) {
        return print_json(&outcomes);
    }
    let mut failed = 0;
    for outcome in &outcomes {
        if outcome.success {
            println!(
                "{} {} → {}",
                "✓".green().bold(),
                outcome.branch.yellow(),
                outcome.commit.short_hex().dimmed()
            );
        } else {
            failed += 1;
            println!(
                "{} {}: {}",
                "✗".red().bold(),
                outcome.branch.yellow(),
                outcome.error.as_deref().unwrap_or("push failed")
            );
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} branches failed to push", outcomes.len());
    }
    Ok(())
}

async fn cmd_remote_branches(
    repo: &Repository,
    args: RemoteOpt,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let branches = repo.remote_branches(&args.remote).await?;
    if matches!(format, OutputFormat::Json) {
        return print_json(&branches);
    }
    for b in &branches {
        let short = b.commit_hash.get(..12).unwrap_or(&b.commit_hash);
        println!(
            "{:<24} {} {}",
            b.name.yellow(),
            short.dimmed(),
            b.pushed_at.to_rfc3339()
        );
    }
    Ok(())
}

fn cmd_whoami(repo: &Repository, format: &OutputFormat) -> anyhow::Result<()> {
    let identity = repo.identity();
    if matches!(format, OutputFormat::Json) {
        return print_json(&serde_json::json!({
            "agent_id": identity.agent_id(),
            "public_key": identity.public_key_field(),
        }));
    }
    println!("Agent ID:   {}", identity.agent_id().to_string().cyan());
    println!("Public key: {}", identity.public_key_field());
    Ok(())
}

async fn cmd_verify_login(repo: &Repository, args: VerifyLoginArgs) -> anyhow::Result<()> {
    let text = if args.proof.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.proof)
            .with_context(|| format!("reading {}", args.proof.display()))?
    };
    let proof: LoginProof = serde_json::from_str(&text).context("parsing login proof")?;

    if args.local {
        let card = repo
            .verify_login_local(&args.remote.remote, &proof, &args.domain)
            .await?;
        println!(
            "{} {} ({}) logged in to {}",
            "✓".green().bold(),
            card.name.bold(),
            proof.agent_id.to_string().cyan(),
            args.domain
        );
    } else {
        let verified = repo
            .verify_login_remote(&args.remote.remote, &proof, &args.domain)
            .await?;
        println!(
            "{} {} ({}) logged in to {}",
            "✓".green().bold(),
            verified.card.name.bold(),
            verified.agent_id.to_string().cyan(),
            verified.domain
        );
    }
    Ok(())
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }
    println!("agentvc server on {}", config.bind_addr.to_string().bold());
    AgentvcServer::new(config).serve().await?;
    Ok(())
}
