use crate::config::BASE_URL_ENV;
use brainmax_common::{ModelCatalog, SortKey};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brainmax")]
#[command(about = "Brainmax 検索結果ブラウザ・文書取込ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドのURL（設定ファイルより優先）
    #[arg(long, global = true, env = BASE_URL_ENV)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ログインしてセッションを保存
    Login {
        /// ユーザー名
        #[arg(required = true)]
        username: String,
    },

    /// セッションを削除
    Logout,

    /// 現在のセッションを表示
    Whoami,

    /// 検索結果を閲覧
    Search {
        /// 検索語（省略時は全件）
        #[arg(default_value = "")]
        query: String,

        /// ソートキー (id/full_name/question/answer)
        #[arg(short, long)]
        sort: Option<SortKey>,

        /// 降順でソート
        #[arg(long, requires = "sort")]
        desc: bool,

        /// 表示ページ（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// 1ページの件数（省略時は設定値）
        #[arg(long)]
        page_size: Option<usize>,

        /// 1件ずつ対話的に閲覧
        #[arg(short, long)]
        interactive: bool,

        /// 全件をExcelに出力
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// 検索結果をExcelに出力
    Export {
        /// 検索語（省略時は全件）
        #[arg(default_value = "")]
        query: String,

        /// ソートキー
        #[arg(short, long)]
        sort: Option<SortKey>,

        /// 降順でソート
        #[arg(long, requires = "sort")]
        desc: bool,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// アップロード済みファイルの一覧
    Files {
        /// アップロード者で絞り込む
        #[arg(short, long)]
        uploader: Option<String>,

        /// 一覧をExcelに出力
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// ファイルをアップロード（フォルダは再帰的に走査）
    Upload {
        /// ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// アップロード者（省略時は設定値）
        #[arg(short, long)]
        uploader: Option<String>,
    },

    /// OCRスキャンを実行
    Scan {
        /// ファイルID
        #[arg(required = true)]
        file_id: i64,

        /// スキャン結果の保存先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// テキストを保存してAI解析
    Annotate {
        /// ファイルID
        #[arg(required = true)]
        file_id: i64,

        /// 保存するテキストのファイル（省略時は保存済みテキスト）
        #[arg(short, long, conflicts_with = "edit")]
        text_file: Option<PathBuf>,

        /// エディタでテキストを編集
        #[arg(short, long)]
        edit: bool,

        /// 解析モデル（複数指定可、省略時は設定値）
        #[arg(short, long)]
        models: Vec<String>,

        /// 解析結果の保存先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// AIとチャット
    Chat {
        /// モデルIDまたは表示名（省略時は設定値）
        #[arg(short, long)]
        model: Option<String>,
    },

    /// モデル一覧を表示
    Models {
        /// カタログ (chat/document)
        #[arg(short, long)]
        catalog: Option<ModelCatalog>,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// バックエンドのURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 1ページの件数を設定
        #[arg(long)]
        set_page_size: Option<usize>,
    },
}
