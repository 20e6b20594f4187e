//! # 图片加载插件：命令行入口
//!
//! 本文件仅负责日志初始化、配置加载与操作注册，
//! 然后按宿主的调用顺序（校验 → 指纹 → 执行）跑一次操作。
//!
//! ```text
//! image-source-loader --schema
//! image-source-loader file <image-name>
//! image-source-loader url - <url>
//! ```

use std::path::Path;

use image_source_loader::error::AppError;
use image_source_loader::image_loader::{self, LOAD_IMAGE_OPERATION, LoaderConfig};
use image_source_loader::registry::{self, OperationInputs};

const CONFIG_ENV: &str = "IMAGE_LOADER_CONFIG";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        log::error!("运行失败（{}）: {}", err.code(), err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => LoaderConfig::load_from_path(Path::new(&path)),
        None => LoaderConfig::default(),
    };
    image_loader::register_operations(config)?;

    let operation = registry::lookup_operation(LOAD_IMAGE_OPERATION)?
        .ok_or_else(|| AppError::Registry(format!("未注册的操作：{}", LOAD_IMAGE_OPERATION)))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("--schema") {
        let schema = operation.schema()?;
        let json = serde_json::to_string_pretty(&schema)
            .map_err(|e| AppError::Registry(format!("序列化 schema 失败: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    let mut inputs = OperationInputs::new();
    let fields = ["source", "image", "url"];
    for (field, value) in fields.iter().zip(args) {
        inputs.insert(field.to_string(), value);
    }

    operation.validate(&inputs)?;
    let fingerprint = operation.fingerprint(&inputs)?;
    let outputs = operation.execute(&inputs)?;

    println!("fingerprint: {}", fingerprint);
    for output in &outputs {
        println!("{:?}: {:?}", output.kind(), output.tensor().shape());
    }

    Ok(())
}
