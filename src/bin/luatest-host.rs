//! luatest-host CLI
//!
//! Discover and run Lua test suites in an embedded interpreter. The exit
//! status is the integer the test expression returns, or -1 on failure.

use anyhow::bail;
use clap::Parser;
use std::path::PathBuf;
use luatest_host::{RunConfig, TestRunner, FAILURE_STATUS};

#[derive(Parser, Debug)]
#[command(name = "luatest-host")]
#[command(version)]
#[command(about = "Run Lua test suites in an embedded interpreter")]
struct Cli {
    /// Directories or files to search for tests
    #[arg(default_value = ".")]
    roots: Vec<String>,

    /// Entry script to run before the test expression
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Lua chunk to evaluate instead of the discovery expression; must return an integer
    #[arg(short = 'e', long = "expr")]
    expr: Option<String>,

    /// Glob matched against test file names
    #[arg(short = 'p', long, default_value = "*.lua")]
    pattern: String,

    /// Only look at the top level of each root
    #[arg(long = "no-recursive")]
    no_recursive: bool,

    /// Don't load the bundled harness (find_test_files, runtests, assert_*)
    #[arg(long = "no-prelude")]
    no_prelude: bool,

    /// Prepend a directory to package.path (repeatable)
    #[arg(short = 'I', long = "lua-path")]
    lua_path: Vec<PathBuf>,

    /// Verbose output: show the run log
    #[arg(short, long)]
    verbose: bool,

    /// List host capabilities available to scripts
    #[arg(long = "list-capabilities")]
    list_capabilities: bool,

    /// Print the expression that would be evaluated, without running it
    #[arg(long = "print-expr")]
    print_expr: bool,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let status = match try_main() {
        Ok(status) => status,
        Err(e) => {
            eprintln!("error: {:#}", e);
            FAILURE_STATUS
        }
    };
    std::process::exit(status);
}

fn try_main() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    if cli.list_capabilities {
        print_capabilities();
        return Ok(0);
    }

    for dir in &cli.lua_path {
        if !dir.is_dir() {
            bail!("--lua-path {}: not a directory", dir.display());
        }
    }

    let config = RunConfig {
        file: cli.file,
        inline: cli.expr,
        roots: cli.roots,
        pattern: cli.pattern,
        recursive: !cli.no_recursive,
        prelude: !cli.no_prelude,
        package_paths: cli.lua_path,
        verbose: cli.verbose,
    };

    if cli.print_expr {
        println!("{}", config.expression());
        return Ok(0);
    }

    let report = TestRunner::new(config).run_all();

    match report.outcome {
        Ok(_) if cli.verbose => eprintln!("{}", report.summary()),
        Ok(_) => {}
        Err(ref e) => eprintln!("could not run tests: {}", e),
    }

    Ok(report.exit_status())
}

fn print_capabilities() {
    println!("Host capabilities (host.<name>):");
    println!();

    let host = luatest_host::Host::new();
    for (name, cap) in &host.capabilities {
        let usage = cap.usage();
        println!("  {:<12} {:<28} {}", name, usage.args, usage.summary);
    }

    println!();
    println!("Harness functions ({}):", luatest_host::PRELUDE_NAME);
    println!();
    println!("  find_test_files(roots, recursive, pattern) -> {{path...}}");
    println!("  runtests(files) -> failures");
    println!("  skip(msg)");
    println!("  assert_equal, assert_not_equal, assert_true, assert_false,");
    println!("  assert_nil, assert_not_nil, assert_match, assert_error");
}
