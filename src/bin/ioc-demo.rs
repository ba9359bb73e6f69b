use clap::Parser;
use ioc::logging::{init_logging, logger_factory, LogFormat, LoggingConfig, ModuleLogger};
use ioc::{Container, ContainerConfig, ContainerError, Factories, Factory};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

/// ioc-demo - wires a small service graph and runs it
#[derive(Parser, Debug)]
#[command(name = "ioc-demo")]
#[command(about = "Builds the demo service graph lazily and runs it")]
struct Args {
    /// Default log level (RUST_LOG overrides it)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Log output format (pretty|compact)
    #[arg(long, default_value = "compact")]
    format: LogFormat,

    /// Container configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print resolution statistics after running
    #[arg(long)]
    stats: bool,
}

struct Demo {
    example: i64,
    log: Arc<ModuleLogger>,
}

impl Demo {
    fn run(&self) {
        self.log.info(format!("Example = {}", self.example));
    }
}

fn create_application(config: ContainerConfig) -> Result<Container, ContainerError> {
    let factories = Factories::new()
        .register("log", logger_factory())
        .register("x", Factory::value(|_, _| Ok(1_i64)))
        .register("y", Factory::value(|_, _| Ok(2_i64)))
        .register("z", Factory::value(|_, _| Ok(3_i64)))
        .register(
            "example",
            Factory::value(|args, _| {
                Ok(*args.get::<i64>(0)? + *args.get::<i64>(1)? + *args.get::<i64>(2)?)
            })
            .params(["x", "y", "z"]),
        )
        .register(
            "demo",
            Factory::value(|args, _| {
                Ok(Demo {
                    example: *args.get::<i64>(0)?,
                    log: args.get::<ModuleLogger>(1)?,
                })
            })
            .params(["example", "log"]),
        );

    Container::with_config(factories, config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        level: args.log_level,
        format: args.format,
        ..LoggingConfig::default()
    })?;

    let config = ContainerConfig::load(args.config.as_deref())?;
    let container = create_application(config)?;

    // demo: Example = 6
    container.get::<Demo>("demo")?.run();

    if args.stats {
        println!("{}", container.stats().summary());
    }

    Ok(())
}
