mod render;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use drugdb_core::fallback::{sample_drugs_matching, FALLBACK_NOTICE};
use drugdb_core::{
    delete_drug_with_notice, logging, ApiError, ClientConfig, ConfigError, DialogMode, DrugClient,
    DrugDialog, DrugFilter, ErrorBoundary, FormField, HealthProber, Rendered, SubmitOutcome, Toast,
    ToastVariant, Transport,
};
use tracing::warn;

#[derive(Parser)]
#[command(name = "drugdb")]
#[command(about = "Browse and manage the drug database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the API base URL (DRUGDB_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the backend is reachable
    Health,
    /// List drugs, optionally filtered
    List(ListArgs),
    /// Show one drug
    Show { id: String },
    /// List drug categories
    Categories,
    /// Add a new drug
    Add(DrugArgs),
    /// Edit an existing drug; omitted fields keep their current values
    Edit {
        id: String,
        #[command(flatten)]
        fields: DrugArgs,
    },
    /// Delete a drug
    Delete { id: String },
}

#[derive(Args)]
struct ListArgs {
    /// Name contains (case-insensitive)
    #[arg(long)]
    name: Option<String>,
    /// Category contains (case-insensitive)
    #[arg(long)]
    category: Option<String>,
    /// Any active ingredient contains
    #[arg(long)]
    ingredient: Option<String>,
    /// Created on or after (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    created_after: Option<String>,
    /// Created on or before (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    created_before: Option<String>,
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    page: u32,
}

#[derive(Args)]
struct DrugArgs {
    #[arg(long)]
    name: Option<String>,
    /// Existing category
    #[arg(long)]
    category: Option<String>,
    /// New category; takes precedence over --category
    #[arg(long)]
    new_category: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Active ingredient (repeatable)
    #[arg(long = "ingredient")]
    ingredients: Vec<String>,
    /// Dosage form (repeatable)
    #[arg(long = "dosage-form")]
    dosage_forms: Vec<String>,
    /// Side effect (repeatable)
    #[arg(long = "side-effect")]
    side_effects: Vec<String>,
    /// Contraindication (repeatable)
    #[arg(long = "contraindication")]
    contraindications: Vec<String>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(cli.api_url.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init();
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };
    logging::init_with_level(config.log_level());

    let mut boundary = ErrorBoundary::new();
    match boundary.render(|| run(cli.command, &config)) {
        Rendered::View(true) => ExitCode::SUCCESS,
        Rendered::View(false) => ExitCode::FAILURE,
        Rendered::Fallback(view) => {
            eprint!("{}", render::fallback(&view, config.shows_debug_info()));
            ExitCode::FAILURE
        }
    }
}

/// Resolve configuration from the environment, letting `--api-url` win.
fn load_config(api_url: Option<&str>) -> Result<ClientConfig, ConfigError> {
    ClientConfig::from_lookup(|key| match (key, api_url) {
        ("DRUGDB_API_URL", Some(url)) => Some(url.to_string()),
        _ => std::env::var(key).ok(),
    })
}

/// Run one command. Expected API failures are rendered as toasts and yield
/// `Ok(false)`; undecodable data escapes to the error boundary.
fn run(command: Commands, config: &ClientConfig) -> Result<bool, ApiError> {
    let client = DrugClient::from_config(config);
    let result = match command {
        Commands::Health => return Ok(cmd_health(config)),
        Commands::List(args) => cmd_list(&client, args, config),
        Commands::Show { id } => client.get_drug(&id).map(|drug| {
            print!("{}", render::drug_detail(&drug));
            true
        }),
        Commands::Categories => client.list_categories().map(|categories| {
            print!("{}", render::categories(&categories));
            true
        }),
        Commands::Add(fields) => Ok(cmd_save(&DrugDialog::create(&client), fields)),
        Commands::Edit { id, fields } => client
            .get_drug(&id)
            .map(|drug| cmd_save(&DrugDialog::edit(&client, &drug), fields)),
        Commands::Delete { id } => client.get_drug(&id).map(|drug| {
            let (notice, removed) = delete_drug_with_notice(&client, &drug);
            print_toast(&notice);
            removed
        }),
    };

    match result {
        Err(e @ (ApiError::Decode(_) | ApiError::Serialization(_))) => Err(e),
        Err(e) => {
            print_toast(&Toast::for_error(&e));
            Ok(false)
        }
        Ok(ok) => Ok(ok),
    }
}

fn cmd_health(config: &ClientConfig) -> bool {
    println!("{} {}", config.app_name, config.app_version);
    let prober = HealthProber::from_config(config);
    let available = prober.check_health();
    if let Some(message) = prober.status_message() {
        if available {
            println!("{message}");
        } else {
            eprintln!("{message}");
        }
    }
    available
}

fn cmd_list<T: Transport>(
    client: &DrugClient<T>,
    args: ListArgs,
    config: &ClientConfig,
) -> Result<bool, ApiError> {
    let filter = DrugFilter {
        name: args.name,
        category: args.category,
        ingredient: args.ingredient,
        created_after: args.created_after,
        created_before: args.created_before,
        ..DrugFilter::default()
    }
    .page(args.page, config.items_per_page);

    let drugs = match client.list_drugs(&filter) {
        Ok(drugs) => drugs,
        Err(e) if e.is_connectivity() && config.mock_data_fallback => {
            warn!(error = %e, "listing sample data instead");
            print_toast(&Toast::destructive("Offline", FALLBACK_NOTICE));
            sample_drugs_matching(&filter)
        }
        Err(e) => return Err(e),
    };
    print!("{}", render::drug_table(&drugs));
    Ok(true)
}

fn cmd_save<T: Transport>(dialog: &DrugDialog<'_, T>, fields: DrugArgs) -> bool {
    fill_form(dialog, fields);
    match dialog.submit() {
        SubmitOutcome::Saved(drug) => {
            let verb = match dialog.mode() {
                DialogMode::Create => "added",
                DialogMode::Edit { .. } => "updated",
            };
            print_toast(&Toast::success("Success", format!("{} has been {verb}.", drug.name)));
            print!("{}", render::drug_detail(&drug));
            true
        }
        SubmitOutcome::Invalid(errors) => {
            eprintln!("{}: please fix the following:", dialog.title());
            eprint!("{}", render::validation_errors(&errors));
            false
        }
        SubmitOutcome::Rejected { notice } => {
            eprintln!("{}: the server rejected these fields:", dialog.title());
            eprint!("{}", render::form_errors(&dialog.form()));
            if let Some(notice) = notice {
                print_toast(&notice);
            }
            false
        }
        SubmitOutcome::Failed { notice, .. } => {
            print_toast(&notice);
            false
        }
        SubmitOutcome::Suppressed => false,
    }
}

/// Copy command-line values into the dialog's form. Repeatable values
/// replace the whole list when any are given.
fn fill_form<T: Transport>(dialog: &DrugDialog<'_, T>, fields: DrugArgs) {
    let mut guard = dialog.form();
    let form = &mut *guard;
    if let Some(name) = fields.name {
        form.name = name;
    }
    if let Some(category) = fields.category {
        form.category = Some(category);
    }
    if fields.new_category.is_some() {
        form.new_category = fields.new_category;
    }
    if let Some(description) = fields.description {
        form.description = description;
    }
    for (field, values) in [
        (FormField::ActiveIngredients, fields.ingredients),
        (FormField::DosageForms, fields.dosage_forms),
        (FormField::SideEffects, fields.side_effects),
        (FormField::Contraindications, fields.contraindications),
    ] {
        let Some(list) = form.list_mut(field) else {
            continue;
        };
        if values.is_empty() {
            continue;
        }
        while list.remove(0).is_some() {}
        for value in &values {
            list.add(value);
        }
    }
}

fn print_toast(toast: &Toast) {
    match toast.variant {
        ToastVariant::Default => print!("{}", render::toast(toast)),
        ToastVariant::Destructive => eprint!("{}", render::toast(toast)),
    }
}
