mod config;
mod db;
mod error;
mod logging;
mod models;
mod ui;

use std::io;
use std::process;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{error, info};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::ui::components::notice::{render_notice, Notice};
use crate::ui::invoice_form::{
    handle_input, load_last_invoice, render_invoice_form, save_invoice, InvoiceFormAction, InvoiceFormState,
};

// Main application state: the one database handle plus the form it serves
struct AppState {
    db: db::Database,
    form_state: InvoiceFormState,
}

impl AppState {
    fn new(db: db::Database) -> Self {
        Self {
            db,
            form_state: InvoiceFormState::new(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::init()?;
    logging::init(&config)?;
    info!("starting invoice form, database {}", config.database_path());

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Without a database there is nothing to do: tell the user and leave
    let db = match db::init(&config).await {
        Ok(db) => db,
        Err(err) => {
            error!("{}", err);
            let notice = Notice::critical(
                "Database Error",
                format!("Failed to connect or initialize the database. Application will exit. ({})", err),
            );
            let shown = show_fatal(&mut terminal, &notice);
            restore_terminal(&mut terminal)?;
            shown?;
            process::exit(1);
        }
    };

    let mut app_state = AppState::new(db);

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state).await;

    app_state.db.close().await;
    restore_terminal(&mut terminal)?;

    // Show any error message
    if let Err(err) = result {
        error!("{}", err);
        println!("Error: {}", err);
    }

    info!("invoice form closed");
    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        terminal.draw(|f| render_invoice_form(f, &mut app_state.form_state))?;

        match handle_input(&mut app_state.form_state)? {
            Some(InvoiceFormAction::Save) => {
                // Outcome is already shown on the form
                save_invoice(&app_state.db, &mut app_state.form_state).await.ok();
            }
            Some(InvoiceFormAction::LoadLast) => {
                load_last_invoice(&app_state.db, &mut app_state.form_state).await.ok();
            }
            Some(InvoiceFormAction::Quit) => break,
            None => {}
        }
    }

    Ok(())
}

// Keep the notice on screen until a key is pressed
fn show_fatal<B: Backend>(terminal: &mut Terminal<B>, notice: &Notice) -> Result<()> {
    loop {
        terminal.draw(|f| {
            let size = f.size();
            render_notice(f, size, notice);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(());
            }
        }
    }
}

fn restore_terminal<B: Backend + io::Write>(terminal: &mut Terminal<B>) -> Result<()> {
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    Ok(())
}
