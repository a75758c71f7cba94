use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use tz_snowflake::{ClockStrategy, DecodedId, GeneratorConfig, IdResult, TimeUnit};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// 设置日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 生成ID，每行一个
    Generate(GenerateArgs),
    /// 把ID拆成各个字段，输出json
    Decode {
        id: i64,
        #[arg(long, value_enum, default_value_t = TimeUnit::Milliseconds)]
        unit: TimeUnit,
        #[arg(long, default_value_t = 0)]
        epoch: i64,
    },
}

#[derive(ClapArgs, Debug)]
struct GenerateArgs {
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,
    /// json 配置文件，命令行参数会覆盖其中的字段
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    machine_id: Option<i64>,
    #[arg(long)]
    epoch: Option<i64>,
    #[arg(long, value_enum)]
    unit: Option<TimeUnit>,
    #[arg(long, value_enum)]
    clock: Option<ClockStrategy>,
}

impl GenerateArgs {
    fn load_config(&self) -> IdResult<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(machine_id) = self.machine_id {
            config.machine_id = machine_id;
        }
        if let Some(epoch) = self.epoch {
            config.epoch = epoch;
        }
        if let Some(unit) = self.unit {
            config.unit = unit;
        }
        if let Some(clock) = self.clock {
            config.clock = clock;
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct DecodeReport {
    id: i64,
    #[serde(flatten)]
    fields: DecodedId,
    unit: TimeUnit,
    unix_time: i64,
    system_time: SystemTime,
}

fn decode_report(id: i64, unit: TimeUnit, epoch: i64) -> DecodeReport {
    let fields = tz_snowflake::decode(id);
    DecodeReport {
        id,
        fields,
        unit,
        unix_time: fields.unix_time(epoch),
        system_time: fields.system_time(unit, epoch),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse(); // 先解析命令行参数
    init_logging(&args.log);

    let result = match args.command {
        Command::Generate(generate) => run_generate(generate).await,
        Command::Decode { id, unit, epoch } => run_decode(id, unit, epoch),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_generate(args: GenerateArgs) -> IdResult<()> {
    let config = args.load_config()?;
    let generator = config.build()?;
    generator.start();
    info!(?config, "生成器已就绪");

    // 序号用完由调用方负责退避，这里等一个时间单位再试
    let tick = config.unit.tick();
    let mut issued = 0;
    while issued < args.count {
        match generator.next_id() {
            Ok(id) => {
                println!("{id}");
                issued += 1;
            }
            Err(e) if e.is_retryable() => {
                debug!("{e}, {tick:?} 后重试");
                sleep(tick).await;
            }
            Err(e) => {
                generator.stop();
                return Err(e);
            }
        }
    }

    generator.stop();
    Ok(())
}

fn run_decode(id: i64, unit: TimeUnit, epoch: i64) -> IdResult<()> {
    let report = decode_report(id, unit, epoch);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env() // 先尝试从 RUST_LOG 读取
        .or_else(|_| EnvFilter::try_new(log_level)) // 失败则用命令行参数
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout 只输出ID
        .with_ansi(true)
        .with_timer(LocalTime::rfc_3339())
        .init();
}
