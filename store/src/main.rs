//! Shelf - a command line front end for the reading tracker.
//!
//! Each command loads the library, performs one engine operation against the
//! PostgreSQL store and prints the result.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shelf_engine::{
    Book, BookForm, DateField, LibraryEngine, LibraryEntry, Ownership, Priority, Rating,
    ReadingStatus, SortOrder,
};
use shelf_store::{Config, PgStore};
use std::{
    error::Error,
    path::{Path, PathBuf},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Engine = LibraryEngine<PgStore>;

#[derive(Parser)]
#[command(name = "shelf", version, about = "Track the books you own, read and want", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List library entries
    List {
        #[arg(long)]
        status: Option<ReadingStatus>,
        #[arg(long, conflicts_with = "not_owned")]
        owned: bool,
        #[arg(long)]
        not_owned: bool,
        #[arg(long, value_enum, default_value_t = SortArg::Recent)]
        sort: SortArg,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Find books by title or author
    Search { query: String },
    /// Show counts per status
    Stats,
    /// Add a book
    Add(AddArgs),
    /// Edit a book and its tracking fields
    Edit(EditArgs),
    /// Change an entry's reading status
    Status { entry_id: String, status: ReadingStatus },
    /// Rate a finished entry (1-5)
    Rate { entry_id: String, rating: i64 },
    /// Toggle whether you own a book
    Own { entry_id: String },
    /// Set or clear a started/finished date (YYYY-MM-DD)
    Date {
        entry_id: String,
        #[arg(value_enum)]
        field: DateArg,
        /// Omit to clear the date
        date: Option<chrono::NaiveDate>,
    },
    /// Replace an entry's notes; omit the text to clear them
    Notes {
        entry_id: String,
        text: Option<String>,
        /// Treat the text as a serialized rich-text document
        #[arg(long)]
        rich: bool,
    },
    /// Delete a book, its entry and its cover
    Delete { book_id: String },
    /// Upload a cover image for a book
    Cover { book_id: String, file: PathBuf },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long, default_value_t = ReadingStatus::Wishlist)]
    status: ReadingStatus,
    #[arg(long, default_value_t = 3)]
    priority: i64,
    #[arg(long)]
    owned: bool,
    #[arg(long)]
    rating: Option<i64>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Cover image to upload
    #[arg(long)]
    cover: Option<PathBuf>,
}

#[derive(Args)]
struct EditArgs {
    book_id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    status: Option<ReadingStatus>,
    #[arg(long)]
    priority: Option<i64>,
    #[arg(long)]
    owned: Option<bool>,
    #[arg(long, conflicts_with = "no_rating")]
    rating: Option<i64>,
    #[arg(long)]
    no_rating: bool,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Recent,
    Priority,
}

#[derive(Clone, Copy, ValueEnum)]
enum DateArg {
    Started,
    Finished,
}

#[derive(Serialize)]
struct ListRow<'a> {
    entry: &'a LibraryEntry,
    book: &'a Book,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelf=info,shelf_engine=info,shelf_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let engine = LibraryEngine::new(PgStore::connect(&config).await?);

    engine.load_all(None).await?;
    run(&engine, cli.command).await
}

async fn run(engine: &Engine, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List {
            status,
            owned,
            not_owned,
            sort,
            json,
        } => {
            let ownership = match (owned, not_owned) {
                (true, _) => Ownership::Owned,
                (_, true) => Ownership::NotOwned,
                _ => Ownership::All,
            };
            let sort = match sort {
                SortArg::Recent => SortOrder::Recent,
                SortArg::Priority => SortOrder::Priority,
            };
            engine.with_state(|state| {
                let mut query = state.query().ownership(ownership).sort(sort);
                if let Some(status) = status {
                    query = query.status(status);
                }
                print_rows(&query.with_books(), json)
            })?;
        }
        Command::Search { query } => {
            engine.with_state(|state| {
                let rows = state.query().matching(&query).with_books();
                print_rows(&rows, false)
            })?;
        }
        Command::Stats => {
            let stats = engine.stats();
            println!("total     {}", stats.total);
            println!("reading   {}", stats.reading);
            println!("finished  {}", stats.finished);
            println!("wishlist  {}", stats.wishlist);
            println!("owned     {}", stats.owned);
        }
        Command::Add(args) => {
            let mut form = BookForm::new(args.title, args.author);
            form.status = args.status;
            form.priority = Priority::try_from(args.priority)?;
            form.owned = args.owned;
            form.rating = args.rating.map(Rating::try_from).transpose()?;
            form.description = args.description;
            form.notes = args.notes;
            if let Some(path) = &args.cover {
                form.cover_url = Some(upload(engine, path).await?);
            }

            match engine.create_book(&form).await {
                Ok(book_id) => println!("added {book_id}"),
                Err(err) => {
                    if let Some(url) = &form.cover_url {
                        engine.discard_cover(url).await;
                    }
                    return Err(failure(engine, err));
                }
            }
        }
        Command::Edit(args) => {
            let mut form = current_form(engine, &args.book_id)?;
            if let Some(title) = args.title {
                form.title = title;
            }
            if let Some(author) = args.author {
                form.author = author;
            }
            if let Some(status) = args.status {
                form.status = status;
                if status == ReadingStatus::Wishlist {
                    form.owned = false;
                }
            }
            if let Some(priority) = args.priority {
                form.priority = Priority::try_from(priority)?;
            }
            if let Some(owned) = args.owned {
                form.owned = owned;
            }
            if let Some(rating) = args.rating {
                form.rating = Some(Rating::try_from(rating)?);
            }
            if args.no_rating || (args.status.is_some() && form.status != ReadingStatus::Finished) {
                form.rating = None;
            }
            if let Some(description) = args.description {
                form.description = Some(description);
            }
            if let Some(notes) = args.notes {
                form.notes = Some(notes);
            }

            engine
                .update_book_and_entry(&args.book_id, &form)
                .await
                .map_err(|err| failure(engine, err))?;
            println!("saved {}", args.book_id);
        }
        Command::Status { entry_id, status } => {
            engine
                .update_status(&entry_id, status)
                .await
                .map_err(|err| failure(engine, err))?;
            print_entry(engine, &entry_id);
        }
        Command::Rate { entry_id, rating } => {
            engine
                .update_rating(&entry_id, rating)
                .await
                .map_err(|err| failure(engine, err))?;
            print_entry(engine, &entry_id);
        }
        Command::Own { entry_id } => {
            engine
                .toggle_owned(&entry_id)
                .await
                .map_err(|err| failure(engine, err))?;
            print_entry(engine, &entry_id);
        }
        Command::Date {
            entry_id,
            field,
            date,
        } => {
            let field = match field {
                DateArg::Started => DateField::StartedAt,
                DateArg::Finished => DateField::FinishedAt,
            };
            engine
                .update_date(&entry_id, field, date)
                .await
                .map_err(|err| failure(engine, err))?;
            print_entry(engine, &entry_id);
        }
        Command::Notes {
            entry_id,
            text,
            rich,
        } => {
            let result = if rich {
                engine.update_rich_notes(&entry_id, text).await
            } else {
                engine.update_notes(&entry_id, text).await
            };
            result.map_err(|err| failure(engine, err))?;
            println!("saved notes for {entry_id}");
        }
        Command::Delete { book_id } => {
            engine
                .delete_book(&book_id)
                .await
                .map_err(|err| failure(engine, err))?;
            println!("deleted {book_id}");
        }
        Command::Cover { book_id, file } => {
            let mut form = current_form(engine, &book_id)?;
            let previous = form.cover_url.take();
            form.cover_url = Some(upload(engine, &file).await?);

            engine
                .update_book_and_entry(&book_id, &form)
                .await
                .map_err(|err| failure(engine, err))?;
            if let Some(url) = previous {
                engine.discard_cover(&url).await;
            }
            println!("cover set for {book_id}");
        }
    }
    Ok(())
}

/// The user-facing message for a failed engine call.
fn failure(engine: &Engine, err: shelf_engine::Error) -> Box<dyn Error> {
    engine.last_error().unwrap_or_else(|| err.to_string()).into()
}

fn current_form(engine: &Engine, book_id: &str) -> Result<BookForm, Box<dyn Error>> {
    engine
        .with_state(|state| {
            let book = state.book(book_id)?;
            let entry = state.entry_for_book(book_id)?;
            Some(BookForm::from_existing(book, entry))
        })
        .ok_or_else(|| format!("no book with id {book_id}").into())
}

async fn upload(engine: &Engine, path: &Path) -> Result<String, Box<dyn Error>> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    engine
        .upload_cover(&file_name, bytes)
        .await
        .map_err(|err| failure(engine, err))
}

fn print_rows(rows: &[(&LibraryEntry, &Book)], json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        let rows: Vec<_> = rows.iter().map(|&(entry, book)| ListRow { entry, book }).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (entry, book) in rows {
        let rating = entry
            .rating
            .map(|r| format!("{}/5", r.get()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<36}  {:<9}  {:<5}  p{}  {:<3}  {} by {}",
            entry.id,
            entry.status.as_str(),
            if entry.owned { "owned" } else { "" },
            entry.priority.get(),
            rating,
            book.title,
            book.author,
        );
    }
    if rows.is_empty() {
        println!("no books");
    }
    Ok(())
}

fn print_entry(engine: &Engine, entry_id: &str) {
    if let Some(entry) = engine.entry(entry_id) {
        let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{}  {}  owned={}  started={}  finished={}",
            entry.id,
            entry.status,
            entry.owned,
            date(entry.started_at),
            date(entry.finished_at),
        );
    }
}
