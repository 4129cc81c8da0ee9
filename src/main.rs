// src/main.rs

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use remix_flat_routes::config::{FlatRoutesOptions, RouteDirs};
use remix_flat_routes::{BuildSession, JsonManifest, Options, RouteScanner, SwcEvaluator};

/// CLI 引数定義
#[derive(Parser, Debug)]
#[command(
    name = "remix-flat-routes",
    version,
    about = "ファイル規約のルートから react-router 用のルート定義モジュールを生成する CLI ツール"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// プロジェクトルート (package.json のあるディレクトリ)
    #[arg(short = 'r', long = "root", value_name = "DIR", default_value = ".", global = true)]
    root: PathBuf,

    /// JSON 設定ファイル。CLI 引数が優先される
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// app ディレクトリ (ルートからの相対パス)
    #[arg(long = "app-dir", value_name = "DIR", global = true)]
    app_dir: Option<PathBuf>,

    /// ルートディレクトリ (app ディレクトリからの相対パス)。複数指定可
    #[arg(long = "route-dir", value_name = "DIR", global = true)]
    route_dir: Vec<PathBuf>,

    /// meta ファイル名 (拡張子なし)
    #[arg(long = "meta", value_name = "NAME", global = true)]
    meta: Option<String>,

    /// 旧形式 (element / lazyComponent) で生成する
    #[arg(long = "legacy", conflicts_with = "data_api", global = true)]
    legacy: bool,

    /// Data API 形式で生成する
    #[arg(long = "data-api", global = true)]
    data_api: bool,

    /// デバッグログを出す
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ルート定義モジュールを生成する
    Generate {
        /// スキャナが出力したフラットなルートマニフェスト (JSON)
        #[arg(short = 'm', long = "manifest", value_name = "FILE")]
        manifest: PathBuf,

        /// 出力先。省略時は標準出力
        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// 機能フラグを付与したマニフェストを JSON で出力する
    Manifest {
        #[arg(short = 'm', long = "manifest", value_name = "FILE")]
        manifest: PathBuf,
    },
}

impl GlobalArgs {
    /// 設定ファイルを読み、CLI 引数で上書きする
    fn options(&self) -> remix_flat_routes::Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::from_file(path)?,
            None => Options::default(),
        };
        if let Some(app_dir) = &self.app_dir {
            options.app_directory = app_dir.clone();
        }
        if !self.route_dir.is_empty() {
            options.flat_routes_options = FlatRoutesOptions {
                route_dir: RouteDirs::Many(self.route_dir.clone()),
            };
        }
        if let Some(meta) = &self.meta {
            options.meta = meta.clone();
        }
        if self.legacy {
            options.legacy = Some(true);
        } else if self.data_api {
            options.legacy = Some(false);
        }
        Ok(options)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) CLI 引数をパースしてログを初期化
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    // 2) 設定を解決 (ルートディレクトリの検証と生成モードの判定を含む)
    let resolved = cli.global.options()?.resolve(&cli.global.root)?;
    let mut session = BuildSession::new(resolved, SwcEvaluator::new());

    match cli.command {
        Command::Generate { manifest, out } => {
            // 3) マニフェストを読み、生成パスを 1 回実行
            let scanner = JsonManifest::new(manifest);
            let options = session.options();
            let flat = scanner.scan(&options.app_dir, &options.route_dirs)?;
            let code = session.generate(&flat)?;

            // 4) 生成結果を書き出す
            match out {
                Some(path) => {
                    fs::write(&path, code)?;
                    info!(out = %path.display(), "生成完了");
                }
                None => print!("{code}"),
            }
        }
        Command::Manifest { manifest } => {
            let scanner = JsonManifest::new(manifest);
            let options = session.options();
            let flat = scanner.scan(&options.app_dir, &options.route_dirs)?;
            let augmented = session.manifest(&flat)?;
            println!("{}", serde_json::to_string_pretty(&augmented)?);
        }
    }

    Ok(())
}
