use crate::logging::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deck-builder")]
#[command(about = "カードデッキのテンプレート描画・ライブプレビューツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ログ形式 (compact/json)
    #[arg(long, default_value = "compact", global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// プロジェクトの概要を表示
    Info {
        /// プロジェクトフォルダ
        #[arg(required = true)]
        project: PathBuf,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// カードを1枚描画
    Render {
        /// プロジェクトフォルダ
        #[arg(required = true)]
        project: PathBuf,

        /// カード番号（0始まり）
        #[arg(short, long, default_value = "0")]
        index: usize,

        /// 言語（省略時はプロジェクトの既定言語）
        #[arg(short, long)]
        lang: Option<String>,

        /// 出力HTMLファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 全カードを描画してフォルダへ出力
    RenderAll {
        /// プロジェクトフォルダ
        #[arg(required = true)]
        project: PathBuf,

        /// 言語（省略時はプロジェクトの既定言語）
        #[arg(short, long)]
        lang: Option<String>,

        /// 出力フォルダ
        #[arg(short, long, required = true)]
        output: PathBuf,
    },

    /// プロジェクトを監視し、変更のたびにカードを描画し直す
    Watch {
        /// プロジェクトフォルダ
        #[arg(required = true)]
        project: PathBuf,

        /// カード番号（0始まり）
        #[arg(short, long, default_value = "0")]
        index: usize,

        /// 言語（省略時はプロジェクトの既定言語）
        #[arg(short, long)]
        lang: Option<String>,

        /// 出力HTMLファイル
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// 変更検知から再読み込みまでの待ち時間（ミリ秒）
        #[arg(long, default_value = "200")]
        debounce_ms: u64,
    },
}
