use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use crate::application::{
    LedgerReport, LedgerService, NewNote, SectionReport, build_report, build_section_report,
};
use crate::domain::format_cents;
use crate::io::Exporter;

/// Empenho - Credit Note & Commitment Ledger
#[derive(Parser)]
#[command(name = "empenho")]
#[command(about = "Tracks credit notes and the commitments drawn against them")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "EMPENHO_DATABASE", default_value = "empenho.db")]
    pub database: String,

    /// Maximum number of concurrent storage connections
    #[arg(long, env = "EMPENHO_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Directory where export artifacts are written
    #[arg(long, env = "EMPENHO_REPORTS_DIR", default_value = "reports")]
    pub reports_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database schema
    Init,

    /// Internal plan management
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Expense nature management
    #[command(subcommand)]
    Nature(NatureCommands),

    /// Requesting section management
    #[command(subcommand)]
    Section(SectionCommands),

    /// Credit note management
    #[command(subcommand)]
    Note(NoteCommands),

    /// Commitment management
    #[command(subcommand)]
    Commitment(CommitmentCommands),

    /// Print the consolidated report, or one requesting section's commitments
    Report {
        /// Restrict to commitments of one requesting section
        #[arg(long)]
        section: Option<String>,
    },

    /// Export the consolidated report
    Export {
        /// Output format: csv, json, xlsx, pdf
        format: String,

        /// Output file (defaults to stdout for csv/json, the reports
        /// directory for xlsx/pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Simulated SIAFI lookup
    Siafi {
        /// SIAFI user name
        #[arg(long)]
        user: String,

        /// SIAFI password
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Register a new internal plan
    Create {
        /// Plan code (stored uppercase, must be unique)
        code: String,
    },
    /// List all internal plans
    List,
    /// Delete a plan, its natures, their notes and those notes' commitments
    Delete {
        /// Plan code
        code: String,
    },
}

#[derive(Subcommand)]
pub enum NatureCommands {
    /// Register a new expense nature under an internal plan
    Create {
        /// Nature code (must be unique)
        code: String,

        /// Parent internal plan code
        #[arg(long)]
        plan: String,
    },
    /// List expense natures
    List {
        /// Filter by internal plan code
        #[arg(long)]
        plan: Option<String>,
    },
    /// Delete an expense nature and, by cascade, its notes
    Delete {
        /// Nature code
        code: String,
    },
}

#[derive(Subcommand)]
pub enum SectionCommands {
    /// Register a new requesting section
    Create {
        /// Section code (stored uppercase, must be unique)
        code: String,
    },
    /// List all requesting sections
    List,
    /// Delete a section; its commitments keep their rows without a section
    Delete {
        /// Section code
        code: String,
    },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Register a new credit note
    Create {
        /// Note number (NC + 6 digits, e.g. NC123456)
        number: String,

        /// Original value (e.g. "1500.00" or "1500,00")
        #[arg(short, long)]
        value: String,

        /// Expense nature code
        #[arg(long)]
        nature: String,

        /// Internal plan code
        #[arg(long)]
        plan: String,

        /// PTRES code (6 digits)
        #[arg(long)]
        ptres: String,

        /// Source code (10 digits)
        #[arg(long)]
        source: String,

        /// Description of the note
        #[arg(short = 'D', long)]
        description: String,

        /// Free-form observation
        #[arg(long)]
        note: Option<String>,

        /// Deadline (DD/MM/YYYY)
        #[arg(long)]
        deadline: String,
    },
    /// List credit notes, newest first
    List {
        /// Filter by expense nature code
        #[arg(long)]
        nature: Option<String>,
    },
    /// Delete a note and all its commitments
    Delete {
        /// Note number
        number: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CommitmentCommands {
    /// Record a commitment against a credit note
    Create {
        /// Parent note number
        #[arg(long)]
        note: String,

        /// Requesting section code
        #[arg(long)]
        section: String,

        /// Commitment value (e.g. "250.00" or "250,00")
        #[arg(short, long)]
        value: String,

        /// Description of the commitment
        #[arg(short = 'D', long)]
        description: String,
    },
    /// List commitments
    List {
        /// Filter by parent note number
        #[arg(long)]
        note: Option<String>,

        /// Filter by requesting section code
        #[arg(long)]
        section: Option<String>,
    },
    /// Delete a commitment, restoring the note's remaining balance
    Delete {
        /// Commitment id
        id: i64,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    async fn service(&self) -> Result<LedgerService> {
        // Connect and migrate; the schema statements are idempotent. A store
        // that cannot be opened fails the whole invocation here.
        Ok(LedgerService::init(&self.database, self.max_connections).await?)
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            Commands::Init => {
                self.service().await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Plan(cmd) => {
                let service = self.service().await?;
                run_plan_command(&service, cmd).await?;
            }

            Commands::Nature(cmd) => {
                let service = self.service().await?;
                run_nature_command(&service, cmd).await?;
            }

            Commands::Section(cmd) => {
                let service = self.service().await?;
                run_section_command(&service, cmd).await?;
            }

            Commands::Note(cmd) => {
                let service = self.service().await?;
                run_note_command(&service, cmd).await?;
            }

            Commands::Commitment(cmd) => {
                let service = self.service().await?;
                run_commitment_command(&service, cmd).await?;
            }

            Commands::Report { section } => {
                let service = self.service().await?;
                match section {
                    Some(code) => {
                        let report = build_section_report(&service, code).await?;
                        print_section_report(&report);
                    }
                    None => {
                        let report = build_report(&service).await?;
                        print_report(&report);
                    }
                }
            }

            Commands::Export { format, output } => {
                let service = self.service().await?;
                let exporter = Exporter::new(&service);
                match format.as_str() {
                    "csv" => match output {
                        Some(path) => {
                            let count = exporter.export_csv(File::create(path)?).await?;
                            println!("Exported {} rows to {}", count, path.display());
                        }
                        None => {
                            exporter.export_csv(io::stdout()).await?;
                        }
                    },
                    "json" => match output {
                        Some(path) => {
                            exporter.export_json(File::create(path)?).await?;
                            println!("Exported report to {}", path.display());
                        }
                        None => {
                            exporter.export_json(io::stdout()).await?;
                            println!();
                        }
                    },
                    "xlsx" => {
                        let path = output
                            .clone()
                            .unwrap_or_else(|| self.reports_dir.join("credit_notes.xlsx"));
                        exporter.save_spreadsheet(&path).await?;
                        println!("Spreadsheet report written to {}", path.display());
                    }
                    "pdf" => {
                        let path = output
                            .clone()
                            .unwrap_or_else(|| self.reports_dir.join("credit_notes.pdf"));
                        exporter.save_document(&path).await?;
                        println!("Document report written to {}", path.display());
                    }
                    other => bail!("unknown export format '{other}' (expected csv, json, xlsx or pdf)"),
                }
            }

            Commands::Siafi { user, password } => {
                let service = self.service().await?;
                let response = service.consult_siafi(user, password);
                println!("SIAFI response: {} ({})", response.message, response.status);
            }
        }

        Ok(())
    }
}

async fn run_plan_command(service: &LedgerService, cmd: &PlanCommands) -> Result<()> {
    match cmd {
        PlanCommands::Create { code } => {
            let plan = service.create_plan(code).await?;
            println!("Internal plan {} created", plan.code);
        }
        PlanCommands::List => {
            let plans = service.list_plans().await?;
            if plans.is_empty() {
                println!("No internal plans registered.");
            }
            for plan in plans {
                println!("{}", plan.code);
            }
        }
        PlanCommands::Delete { code } => {
            service.delete_plan(code).await?;
            println!("Internal plan {} deleted", code.trim().to_uppercase());
        }
    }
    Ok(())
}

async fn run_nature_command(service: &LedgerService, cmd: &NatureCommands) -> Result<()> {
    match cmd {
        NatureCommands::Create { code, plan } => {
            let nature = service.create_nature(code, plan).await?;
            println!(
                "Expense nature {} created under plan {}",
                nature.code, nature.plan_code
            );
        }
        NatureCommands::List { plan } => {
            let natures = service.list_natures(plan.as_deref()).await?;
            if natures.is_empty() {
                println!("No expense natures registered.");
            }
            for nature in natures {
                println!("{:<16} plan: {}", nature.code, nature.plan_code);
            }
        }
        NatureCommands::Delete { code } => {
            service.delete_nature(code).await?;
            println!("Expense nature {} deleted", code.trim());
        }
    }
    Ok(())
}

async fn run_section_command(service: &LedgerService, cmd: &SectionCommands) -> Result<()> {
    match cmd {
        SectionCommands::Create { code } => {
            let section = service.create_section(code).await?;
            println!("Requesting section {} created", section.code);
        }
        SectionCommands::List => {
            let sections = service.list_sections().await?;
            if sections.is_empty() {
                println!("No requesting sections registered.");
            }
            for section in sections {
                println!("{}", section.code);
            }
        }
        SectionCommands::Delete { code } => {
            service.delete_section(code).await?;
            println!("Requesting section {} deleted", code.trim().to_uppercase());
        }
    }
    Ok(())
}

async fn run_note_command(service: &LedgerService, cmd: &NoteCommands) -> Result<()> {
    match cmd {
        NoteCommands::Create {
            number,
            value,
            nature,
            plan,
            ptres,
            source,
            description,
            note,
            deadline,
        } => {
            let created = service
                .create_note(NewNote {
                    number,
                    value,
                    nature_code: nature,
                    plan_code: plan,
                    ptres,
                    source,
                    description,
                    note_text: note.clone(),
                    deadline,
                })
                .await?;
            println!(
                "Credit note {} created with value {}",
                created.number,
                format_cents(created.value)
            );
        }
        NoteCommands::List { nature } => {
            let notes = service.list_notes(nature.as_deref()).await?;
            if notes.is_empty() {
                println!("No credit notes registered.");
            }
            for note in notes {
                println!(
                    "{:<10} {:>14} remaining {:>14}  deadline {}  {}",
                    note.number,
                    format_cents(note.value),
                    format_cents(note.remaining),
                    note.deadline.format("%d/%m/%Y"),
                    note.description
                );
            }
        }
        NoteCommands::Delete { number, yes } => {
            let deleted = service.delete_note(number, *yes).await?;
            println!("Credit note {} deleted with all its commitments", deleted.number);
        }
    }
    Ok(())
}

async fn run_commitment_command(service: &LedgerService, cmd: &CommitmentCommands) -> Result<()> {
    match cmd {
        CommitmentCommands::Create {
            note,
            section,
            value,
            description,
        } => {
            let commitment = service
                .create_commitment(note, section, value, description)
                .await?;
            println!(
                "Commitment of {} recorded on note {} (id {})",
                format_cents(commitment.value),
                commitment.note_number,
                commitment.id
            );
        }
        CommitmentCommands::List { note, section } => {
            let commitments = service
                .list_commitments(note.as_deref(), section.as_deref())
                .await?;
            if commitments.is_empty() {
                println!("No commitments found.");
            }
            for commitment in commitments {
                println!(
                    "{:<6} {:<10} {:>14}  {}  section {}  {}",
                    commitment.id,
                    commitment.note_number,
                    format_cents(commitment.value),
                    commitment.created_at.format("%d/%m/%Y %H:%M"),
                    commitment.section_code.as_deref().unwrap_or("N/A"),
                    commitment.description
                );
            }
        }
        CommitmentCommands::Delete { id, yes } => {
            if !*yes {
                bail!("pass --yes to confirm deleting commitment {id}");
            }
            let deleted = service.delete_commitment(*id).await?;
            println!(
                "Commitment {} deleted; {} restored to note {}",
                deleted.id,
                format_cents(deleted.value),
                deleted.note_number
            );
        }
    }
    Ok(())
}

fn print_report(report: &LedgerReport) {
    if report.rows.is_empty() {
        println!("No data to display.");
        return;
    }

    println!(
        "{:<10} {:<10} {:<12} {:<8} {:>14} {:>14} {:<12} {:>14} {:<8}",
        "Note", "Plan", "Nature", "PTRES", "Original", "Remaining", "Commit date", "Commit val", "Section"
    );
    for row in &report.rows {
        let (date, value, section) = match &row.commitment {
            Some(c) => (
                c.date.format("%d/%m/%Y").to_string(),
                format_cents(c.value),
                c.section_code.clone(),
            ),
            None => ("-".to_string(), "-".to_string(), "N/A".to_string()),
        };
        println!(
            "{:<10} {:<10} {:<12} {:<8} {:>14} {:>14} {:<12} {:>14} {:<8}",
            row.note_number,
            row.plan_code,
            row.nature_code,
            row.ptres,
            format_cents(row.note_value),
            format_cents(row.note_remaining),
            date,
            value,
            section
        );
    }

    println!();
    println!(
        "Totals: original {}  remaining {}  committed {}",
        format_cents(report.totals.original),
        format_cents(report.totals.remaining),
        format_cents(report.totals.committed)
    );
}

fn print_section_report(report: &SectionReport) {
    if report.commitments.is_empty() {
        println!("No commitments found for section {}.", report.section_code);
        return;
    }

    println!("Commitments for section {}:", report.section_code);
    for commitment in &report.commitments {
        println!(
            "{:<6} {:<10} {:>14}  {}  {}",
            commitment.id,
            commitment.note_number,
            format_cents(commitment.value),
            commitment.created_at.format("%d/%m/%Y %H:%M"),
            commitment.description
        );
    }
    println!("Section total: {}", format_cents(report.total));
}
