use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "agentvc",
    about = "Version control and signed publishing for agent cards",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Repository directory (searched upwards)
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a repository and an agent identity
    Init(InitArgs),
    /// Show branch, identity and uncommitted changes
    Status,
    /// Snapshot the working card
    Commit(CommitArgs),
    /// Show commit history
    Log(LogArgs),
    /// Compare HEAD with the working card, a branch, or a commit
    Diff(DiffArgs),
    /// List, create, or delete branches
    Branch(BranchArgs),
    /// Switch branches
    Checkout(CheckoutArgs),
    /// Manage remotes
    Remote(RemoteArgs),
    /// Push branches to a remote
    Push(PushArgs),
    /// List branches held by a remote
    RemoteBranches(RemoteOpt),
    /// Delete a branch on a remote
    DeleteRemote(DeleteRemoteArgs),
    /// Fetch this agent's published card for a branch
    Fetch(FetchArgs),
    /// Show the agent identity
    Whoami,
    /// Sign a login proof for a domain
    SignLogin(SignLoginArgs),
    /// Verify a login proof
    VerifyLogin(VerifyLoginArgs),
    /// Run the reference card server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Branch name or commit digest
    pub target: Option<String>,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: Option<String>,
    #[arg(short = 'd', long)]
    pub delete: bool,
}

#[derive(Args)]
pub struct CheckoutArgs {
    pub branch: String,
}

#[derive(Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub action: Option<RemoteAction>,
}

#[derive(Subcommand)]
pub enum RemoteAction {
    Add {
        name: String,
        url: String,
        #[arg(long)]
        card_url: Option<String>,
    },
}

#[derive(Args)]
pub struct RemoteOpt {
    #[arg(long, default_value = "origin")]
    pub remote: String,
}

#[derive(Args)]
pub struct PushArgs {
    /// Push only this branch
    pub branch: Option<String>,
    #[command(flatten)]
    pub remote: RemoteOpt,
}

#[derive(Args)]
pub struct DeleteRemoteArgs {
    pub branch: String,
    #[command(flatten)]
    pub remote: RemoteOpt,
}

#[derive(Args)]
pub struct FetchArgs {
    pub branch: String,
    #[command(flatten)]
    pub remote: RemoteOpt,
}

#[derive(Args)]
pub struct SignLoginArgs {
    #[arg(long)]
    pub domain: String,
}

#[derive(Args)]
pub struct VerifyLoginArgs {
    /// File holding the proof JSON, or `-` for stdin
    pub proof: PathBuf,
    #[arg(long)]
    pub domain: String,
    /// Check against the published card instead of asking the remote
    #[arg(long)]
    pub local: bool,
    #[command(flatten)]
    pub remote: RemoteOpt,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    /// TOML server configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["agentvc", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(InitArgs { path: None })));
    }

    #[test]
    fn parse_commit() {
        let cli = Cli::try_parse_from(["agentvc", "commit", "-m", "hello"]).unwrap();
        if let Command::Commit(args) = cli.command {
            assert_eq!(args.message, "hello");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn commit_requires_message() {
        assert!(Cli::try_parse_from(["agentvc", "commit"]).is_err());
    }

    #[test]
    fn parse_log_limit() {
        let cli = Cli::try_parse_from(["agentvc", "log", "-n", "5", "--oneline"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert_eq!(args.limit, 5);
            assert!(args.oneline);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn log_limit_defaults_to_fifty() {
        let cli = Cli::try_parse_from(["agentvc", "log"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert_eq!(args.limit, 50);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_branch_delete() {
        let cli = Cli::try_parse_from(["agentvc", "branch", "-d", "faam.io"]).unwrap();
        if let Command::Branch(args) = cli.command {
            assert!(args.delete);
            assert_eq!(args.name.as_deref(), Some("faam.io"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_push_defaults_to_origin() {
        let cli = Cli::try_parse_from(["agentvc", "push", "faam.io"]).unwrap();
        if let Command::Push(args) = cli.command {
            assert_eq!(args.branch.as_deref(), Some("faam.io"));
            assert_eq!(args.remote.remote, "origin");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_remote_add() {
        let cli = Cli::try_parse_from([
            "agentvc",
            "remote",
            "add",
            "origin",
            "http://localhost:8787",
        ])
        .unwrap();
        if let Command::Remote(args) = cli.command {
            assert!(matches!(args.action, Some(RemoteAction::Add { card_url: None, .. })));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_kebab_case_commands() {
        assert!(matches!(
            Cli::try_parse_from(["agentvc", "remote-branches"]).unwrap().command,
            Command::RemoteBranches(_)
        ));
        assert!(matches!(
            Cli::try_parse_from(["agentvc", "delete-remote", "old"]).unwrap().command,
            Command::DeleteRemote(_)
        ));
        assert!(matches!(
            Cli::try_parse_from(["agentvc", "sign-login", "--domain", "faam.io"])
                .unwrap()
                .command,
            Command::SignLogin(_)
        ));
    }

    #[test]
    fn parse_verify_login() {
        let cli = Cli::try_parse_from([
            "agentvc",
            "verify-login",
            "proof.json",
            "--domain",
            "faam.io",
            "--local",
        ])
        .unwrap();
        if let Command::VerifyLogin(args) = cli.command {
            assert!(args.local);
            assert_eq!(args.domain, "faam.io");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verbosity() {
        let cli = Cli::try_parse_from(["agentvc", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["agentvc", "--format", "json", "whoami"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["agentvc", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind.as_deref(), Some("0.0.0.0:8080"));
        } else {
            panic!("wrong command");
        }
    }
}
