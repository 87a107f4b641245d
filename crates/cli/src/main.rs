use clap::Parser;
use ibadm_cli::{
	cli::Cli,
	commands,
	error::CliError,
	logging,
	output::{self, OutputFormat, ResultBuilder},
};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli, format).await {
		handle_error(&err, command, format);
		std::process::exit(1);
	}
}

fn handle_error(err: &CliError, command: &str, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	// Always print to stderr for humans
	output::print_error_stderr(&cmd_error);

	// The JSON envelope goes to stdout with ok=false
	if format == OutputFormat::Json {
		let result: output::CommandResult<()> = ResultBuilder::new(command).command_error(cmd_error).build();
		output::print_result(&result, format);
	}
}
