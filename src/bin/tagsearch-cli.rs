use anyhow::{Context, Result};
use clap::Parser;
use tagsearch::{Config, Query};
use tagsearch_sql::Order;

#[derive(Parser)]
struct Cli {
    /// Root of the filesystem cache tree.
    #[clap(long, default_value = "./tagsearch-cache")]
    cache_base: String,

    /// `diesel`-compatible connection string (a SQLite file path).
    #[clap(long, default_value = "tagsearch.sqlite3")]
    database_url: String,

    #[clap(long)]
    limit_tag: Option<u32>,

    #[clap(long, default_value_t = 10)]
    page_size: i64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let config = Config::new(cli.cache_base, cli.database_url)
        .with_limit_tag(cli.limit_tag)
        .with_max_show_count(cli.page_size);
    let query = Query::new(config);

    println!("tagsearch-cli — commands: search <q> [page], add <id> <postDate> <updateDate> <tag,tag,...>, delete <id>, sweep, /bye");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        use std::io::Write;
        std::io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.read_line(&mut line).context("read stdin")? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/bye" {
            break;
        }
        if let Err(e) = handle_command(&query, line) {
            eprintln!("error: {e:?}");
        }
    }
    Ok(())
}

fn handle_command(query: &Query, line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("search") => {
            let rest: Vec<&str> = parts.collect();
            let (page, query_text) = match rest.split_last() {
                Some((maybe_page, prefix)) if maybe_page.parse::<u32>().is_ok() && !prefix.is_empty() => {
                    (maybe_page.parse().unwrap(), prefix.join(" "))
                }
                _ => (1, rest.join(" ")),
            };
            let result = query.search(&query_text, page, Order::DescPostDate)?;
            println!("{} total, page {page}:", result.count);
            for id in result.id_list {
                println!("  {id}");
            }
        }
        Some("add") => {
            let article_id = parts.next().context("missing article id")?;
            let post_date = parts.next().context("missing post date")?;
            let update_date = parts.next().context("missing update date")?;
            let tags: Vec<String> = parts
                .next()
                .unwrap_or("")
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            query.insert_or_update_article(article_id, post_date, update_date, &tags)?;
            println!("ok");
        }
        Some("delete") => {
            let article_id = parts.next().context("missing article id")?;
            query.delete_article(article_id)?;
            println!("ok");
        }
        Some("sweep") => {
            let report = query.sweep_filesystem()?;
            println!(
                "ok: {} directories removed, {} errors",
                report.directories_removed, report.errors
            );
        }
        Some(other) => {
            eprintln!("unknown command: {other}");
        }
        None => {}
    }
    Ok(())
}
