use crate::infra::CatalogArgs;
use crate::report::{run_eligibility, run_progress, EligibilityArgs, ProgressArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use degree_planner::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Degree Planner",
    about = "Serve or query prerequisite eligibility and degree progress",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Check whether a student may take a course and list what is missing
    Eligibility(EligibilityArgs),
    /// Print progress toward a student's declared majors
    Progress(ProgressArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Eligibility(args) => run_eligibility(args),
        Command::Progress(args) => run_progress(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["degree-planner"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn progress_accepts_major_filter() {
        let cli = Cli::try_parse_from([
            "degree-planner",
            "progress",
            "--catalog",
            "catalog.json",
            "--student",
            "7",
            "--major",
            "CS_BS",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Progress(args)) => {
                assert_eq!(args.student, 7);
                let major = args.major.expect("major parsed");
                assert_eq!(major.code, "CS");
                assert_eq!(major.designation, "BS");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn eligibility_requires_student_and_course() {
        assert!(Cli::try_parse_from(["degree-planner", "eligibility", "--student", "7"]).is_err());
    }
}
