use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, MAX_CHECK_SYMBOLS, UserNew, markup};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "fiscal_admin")]
#[command(about = "Admin utilities for Fiscal (bootstrap users, print receipts)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./fiscal.db?mode=rwc")]
    database_url: String,

    /// Key refresh tokens are signed with. Tokens issued here are discarded.
    #[arg(
        long,
        env = "FISCAL__SERVER__SECRET_KEY",
        default_value = "fiscal-admin",
        hide_env_values = true
    )]
    secret_key: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Check(Check),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone_number: Option<String>,
}

#[derive(Args, Debug)]
struct Check {
    #[command(subcommand)]
    command: CheckCommand,
}

#[derive(Subcommand, Debug)]
enum CheckCommand {
    /// Print a check as it comes out of the receipt printer.
    Render(CheckRenderArgs),
}

#[derive(Args, Debug)]
struct CheckRenderArgs {
    #[arg(long)]
    id: i64,
    /// Printer width; defaults to the issuer's configured width.
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_CHECK_SYMBOLS))]
    width: Option<i64>,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .secret_key(cli.secret_key)
        .build()
        .await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            engine
                .create_user(UserNew {
                    username: args.username.clone(),
                    first_name: args.first_name,
                    last_name: args.last_name,
                    phone_number: args.phone_number,
                    email: args.email,
                    password1: password.clone(),
                    password2: password,
                })
                .await?;

            println!("created user: {}", args.username);
        }
        Command::Check(Check {
            command: CheckCommand::Render(args),
        }) => {
            let lines = engine.render_receipt(args.id, args.width).await?;
            if lines.is_empty() {
                eprintln!("check not found: {}", args.id);
                std::process::exit(1);
            }
            println!("{}", markup::render_text(&lines));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_width(args: &[&str]) -> Result<Option<i64>, clap::Error> {
        let cli = Cli::try_parse_from(
            ["fiscal_admin", "check", "render", "--id", "1"]
                .iter()
                .chain(args),
        )?;
        match cli.command {
            Command::Check(Check {
                command: CheckCommand::Render(args),
            }) => Ok(args.width),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn render_width_is_bounded() {
        assert_eq!(render_width(&[]).unwrap(), None);
        assert_eq!(render_width(&["--width", "1"]).unwrap(), Some(1));
        assert_eq!(render_width(&["--width", "500"]).unwrap(), Some(500));
        assert!(render_width(&["--width", "0"]).is_err());
        assert!(render_width(&["--width", "501"]).is_err());
        assert!(render_width(&["--width", "2147483647"]).is_err());
    }
}
