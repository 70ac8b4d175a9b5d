// ==========================================
// 礼物交换抽签系统 - 命令行主入口
// ==========================================
// 技术栈: clap + tokio + SQLite
// 退出码: 0 成功 / 2 无可行配对 / 3 名单校验失败 / 1 其他
// ==========================================

use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use secret_santa::api::{
    ApiError, ApiResult, CommittedDraw, LiveDrawSummary, MasterListStatus, TrialDraw,
};
use secret_santa::app::{draw_day, get_default_db_path, should_run_scheduled, AppState};
use secret_santa::config::{config_keys, DrawConfigReader};
use secret_santa::domain::{ParticipantId, Round};
use secret_santa::i18n::{t, t_with_args};
use secret_santa::importer::{is_valid_email, RowStatus};
use secret_santa::notify::OutboxNotifier;
use secret_santa::{i18n, logging};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "secret-santa")]
#[command(about = "Secret Santa drawing with family exclusions and round history", version)]
struct Cli {
    /// 数据库文件路径（默认: $SECRET_SANTA_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 输出语言（zh-CN / en）
    #[arg(long, global = true)]
    lang: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 初始化数据库
    Init,

    /// 导入名单（.csv / .xlsx）
    Import { file: PathBuf },

    /// 列出参与者
    Participants,

    /// 抽签（默认试运行，--live 提交并发送通知，--commit-only 只提交）
    Draw {
        /// 轮次（默认今年）
        #[arg(long)]
        round: Option<i32>,

        #[arg(long, conflicts_with = "commit_only")]
        live: bool,

        /// 只保存配对、不发送通知（补录历史 / 重测某轮）
        #[arg(long)]
        commit_only: bool,

        /// 不回避上一轮配对
        #[arg(long)]
        no_history: bool,

        /// 固定随机种子
        #[arg(long)]
        seed: Option<u64>,
    },

    /// 向发件箱写一封自检邮件（默认发给发件人地址）
    SendTest {
        #[arg(long)]
        to: Option<String>,
    },

    /// 定时抽签（仅在抽签日执行正式抽签）
    Scheduled {
        #[arg(long)]
        force: bool,
    },

    /// 查看已提交的配对
    Pairings {
        #[arg(long)]
        round: Option<i32>,
    },

    /// 查看打开统计
    Opens {
        #[arg(long)]
        round: Option<i32>,
    },

    /// 记录一次通知打开
    RecordOpen {
        #[arg(long)]
        participant: i64,

        #[arg(long)]
        round: Option<i32>,

        #[arg(long)]
        ip: Option<String>,

        #[arg(long)]
        user_agent: Option<String>,
    },

    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Get { key: String },
    Set { key: String, value: String },
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_with_verbosity(cli.verbose);

    if let Some(lang) = cli.lang.as_deref() {
        if !i18n::set_locale(lang) {
            tracing::warn!(lang, "不支持的语言，使用默认语言");
        }
    }

    tracing::debug!(version = secret_santa::VERSION, "{}", secret_santa::APP_NAME);

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "命令执行失败");
            eprintln!("{}", t_with_args("common.error", &[("message", &e.to_string())]));
            if e.is_infeasible() {
                eprintln!("{}", t("draw.infeasible_hint"));
            }
            e.exit_code()
        }
    };

    std::process::exit(code);
}

fn current_round() -> Round {
    Round(Local::now().year())
}

async fn run(cli: Cli) -> ApiResult<()> {
    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path)?;

    match cli.command {
        Command::Init => {
            println!("{}", t_with_args("init.done", &[("path", &state.db_path)]));
        }

        Command::Import { file } => {
            if !file.exists() {
                return Err(ApiError::InvalidInput(t_with_args(
                    "import.file_not_found",
                    &[("path", &file.display().to_string())],
                )));
            }
            let summary = state.importer().import_file(&file)?;

            if summary.header_detected {
                println!("{}", t("import.header_detected"));
            } else {
                println!("{}", t("import.headerless"));
            }
            for row in &summary.rows {
                if let RowStatus::Skipped(reason) = &row.status {
                    println!(
                        "{}",
                        t_with_args(
                            "import.row_skipped",
                            &[
                                ("line", &row.line.to_string()),
                                ("email", &row.email),
                                ("reason", reason.describe()),
                            ],
                        )
                    );
                }
            }
            println!(
                "{}",
                t_with_args(
                    "import.summary",
                    &[
                        ("processed", &summary.processed.to_string()),
                        ("inserted", &summary.inserted.to_string()),
                        ("skipped", &summary.skipped.to_string()),
                    ],
                )
            );
        }

        Command::Participants => {
            let records = state.participant_repo.find_all_records()?;
            if records.is_empty() {
                println!("{}", t("participants.empty"));
            }
            for r in &records {
                let p = &r.participant;
                println!(
                    "{:>4}  {:<24} {:<32} group={}",
                    p.id,
                    p.display_name(),
                    p.email.as_deref().unwrap_or("-"),
                    p.group
                );
            }
            if !records.is_empty() {
                println!("{}", t_with_args("participants.total", &[("count", &records.len().to_string())]));
            }
        }

        Command::Draw {
            round,
            live,
            commit_only,
            no_history,
            seed,
        } => {
            let round = round.map(Round).unwrap_or_else(current_round);
            let avoid_previous = if no_history { Some(false) } else { None };
            let api = state.draw_api(seed);

            if live {
                print_live(&api.live(round, avoid_previous).await?);
            } else if commit_only {
                print_committed(&api.commit_only(round, avoid_previous)?);
            } else {
                print_trial(&api.trial(round, avoid_previous)?);
            }
        }

        Command::SendTest { to } => {
            let to = match to {
                Some(addr) => addr,
                None => state
                    .config_manager
                    .from_email()?
                    .ok_or_else(|| ApiError::InvalidInput(t("send_test.no_address")))?,
            };
            if !is_valid_email(to.trim()) {
                return Err(ApiError::InvalidInput(t_with_args("send_test.invalid_address", &[("to", &to)])));
            }

            let notifier = OutboxNotifier::from_config(&*state.config_manager)?;
            let path = notifier.send_test(&to, current_round()).await?;
            println!(
                "{}",
                t_with_args(
                    "send_test.written",
                    &[("to", to.trim()), ("path", &path.display().to_string())],
                )
            );
        }

        Command::Scheduled { force } => {
            let today = Local::now().date_naive();
            if !should_run_scheduled(today, force) {
                let day = draw_day(today.year()).map(|d| d.to_string()).unwrap_or_default();
                println!(
                    "{}",
                    t_with_args(
                        "schedule.not_today",
                        &[("today", &today.to_string()), ("draw_day", &day)],
                    )
                );
                return Ok(());
            }
            let summary = state.draw_api(None).live(Round(today.year()), None).await?;
            print_live(&summary);
        }

        Command::Pairings { round } => {
            let round = round.map(Round).unwrap_or_else(current_round);
            let rows = state.draw_api(None).pairings(round)?;
            if rows.is_empty() {
                println!("{}", t_with_args("pairings.empty", &[("round", &round.to_string())]));
            }
            for row in rows {
                println!("{} -> {}", row.giver_name, row.receiver_name);
            }
        }

        Command::Opens { round } => {
            let round = round.map(Round).unwrap_or_else(current_round);
            let stats = state.draw_api(None).open_stats(round)?;
            if stats.is_empty() {
                println!("{}", t_with_args("opens.empty", &[("round", &round.to_string())]));
            }
            for s in stats {
                println!(
                    "{:>4}  count={:<3} first={} last={} ip={}",
                    s.participant_id,
                    s.open_count,
                    s.first_opened_at,
                    s.last_opened_at,
                    s.last_ip.as_deref().unwrap_or("-")
                );
            }
        }

        Command::RecordOpen {
            participant,
            round,
            ip,
            user_agent,
        } => {
            let round = round.map(Round).unwrap_or_else(current_round);
            let recorded = state.tracking_api().record_open(
                ParticipantId(participant),
                round,
                ip.as_deref(),
                user_agent.as_deref(),
            );
            // 尽力而为，不影响退出码
            println!("{}", if recorded { t("tracking.recorded") } else { t("tracking.ignored") });
        }

        Command::Config { action } => run_config(&state, action)?,
    }

    Ok(())
}

fn ensure_known_key(key: &str) -> ApiResult<()> {
    if config_keys::ALL.contains(&key) {
        return Ok(());
    }
    Err(ApiError::InvalidInput(t_with_args(
        "config.unknown_key",
        &[("key", key), ("keys", &config_keys::ALL.join(", "))],
    )))
}

fn run_config(state: &AppState, action: ConfigAction) -> ApiResult<()> {
    match action {
        ConfigAction::Get { key } => {
            ensure_known_key(&key)?;
            match state.config_manager.get_config_value(&key)? {
                Some(value) => println!("{}", value),
                None => println!("{}", t_with_args("config.not_set", &[("key", &key)])),
            }
        }
        ConfigAction::Set { key, value } => {
            ensure_known_key(&key)?;
            state.config_manager.set_config(&key, &value)?;
            println!("{}", t_with_args("config.saved", &[("key", &key)]));
        }
        ConfigAction::List => {
            for (key, value) in state.config_manager.list_configs()? {
                println!("{} = {}", key, value);
            }
        }
    }
    Ok(())
}

fn print_trial(trial: &TrialDraw) {
    println!("{}", t_with_args("draw.trial_header", &[("round", &trial.round.to_string())]));
    println!("{}", if trial.history_applied { t("draw.history_on") } else { t("draw.history_off") });
    for row in &trial.rows {
        let marker = if row.repeats_previous { t("draw.repeat_marker") } else { String::new() };
        println!(
            "{} [{}] -> {} [{}]{}",
            row.giver_name, row.giver_group, row.receiver_name, row.receiver_group, marker
        );
    }
}

fn print_committed(committed: &CommittedDraw) {
    println!(
        "{}",
        t_with_args(
            "draw.commit_only_done",
            &[
                ("round", &committed.round.to_string()),
                ("pairs", &committed.pairs_committed.to_string()),
            ],
        )
    );
    println!("{}", if committed.history_applied { t("draw.history_on") } else { t("draw.history_off") });
    for row in &committed.rows {
        println!("{} -> {}", row.giver_name, row.receiver_name);
    }
}

fn print_live(summary: &LiveDrawSummary) {
    println!(
        "{}",
        t_with_args(
            "draw.live_done",
            &[
                ("round", &summary.round.to_string()),
                ("pairs", &summary.pairs_committed.to_string()),
            ],
        )
    );
    println!("{}", if summary.history_applied { t("draw.history_on") } else { t("draw.history_off") });
    println!(
        "{}",
        t_with_args(
            "draw.delivered",
            &[
                ("delivered", &summary.delivery.delivered.len().to_string()),
                ("failed", &summary.delivery.failures.len().to_string()),
            ],
        )
    );
    for failure in &summary.delivery.failures {
        println!(
            "{}",
            t_with_args(
                "draw.delivery_failed",
                &[
                    ("id", &failure.participant_id.to_string()),
                    ("reason", &failure.reason),
                ],
            )
        );
    }
    match &summary.master_list {
        MasterListStatus::Sent => println!("{}", t("draw.master_sent")),
        MasterListStatus::Skipped => println!("{}", t("draw.master_skipped")),
        MasterListStatus::Failed(reason) => {
            println!("{}", t_with_args("draw.master_failed", &[("reason", reason)]))
        }
    }
}
