use clap::{Args, Parser, Subcommand};
use pms_core::{CoreConfig, Patch, PatientDraft, PatientService, PatientUpdate};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pms")]
#[command(about = "Patient management system CLI")]
struct Cli {
    /// Patient collection document
    #[arg(long, env = "PATIENT_DATA_FILE", default_value = pms_core::DEFAULT_PATIENT_DATA_FILE)]
    data_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty patient data file if none exists
    Init,
    /// List all patients keyed by id
    List,
    /// Show one patient
    Show {
        /// Patient id
        id: String,
    },
    /// List patients ordered by a field
    Sort {
        /// Field to sort on (only `age`)
        #[arg(long = "by", default_value = "age")]
        sort_by: String,
        /// `asc` (default) or `desc`
        #[arg(long)]
        order: Option<String>,
    },
    /// Create a patient
    Create(CreateArgs),
    /// Update selected fields of a patient
    Update(UpdateArgs),
    /// Delete a patient
    Delete {
        /// Patient id
        id: String,
    },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    city: String,
    #[arg(long, allow_negative_numbers = true)]
    age: i64,
    /// `male` or `female`
    #[arg(long)]
    gender: String,
    /// Weight in kg
    #[arg(long, allow_negative_numbers = true)]
    weight: i64,
    /// Height in cm
    #[arg(long, allow_negative_numbers = true)]
    height: i64,
    /// Medical history entry (repeatable)
    #[arg(long = "history")]
    medical_history: Vec<String>,
}

impl From<CreateArgs> for PatientDraft {
    fn from(args: CreateArgs) -> Self {
        PatientDraft {
            id: Some(args.id),
            name: Some(args.name),
            city: Some(args.city),
            age: Some(args.age),
            gender: Some(args.gender),
            weight: Some(args.weight),
            height: Some(args.height),
            medical_history: Some(args.medical_history),
        }
    }
}

#[derive(Args)]
struct UpdateArgs {
    /// Patient id
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    age: Option<i64>,
    /// Any case; stored lowercase
    #[arg(long)]
    gender: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    weight: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    height: Option<i64>,
    /// Replaces the whole medical history; pass with no values to empty it
    #[arg(long = "history", num_args = 0..)]
    medical_history: Option<Vec<String>>,
}

impl UpdateArgs {
    fn into_parts(self) -> (String, PatientUpdate) {
        let update = PatientUpdate {
            name: Patch::from(self.name),
            city: Patch::from(self.city),
            age: Patch::from(self.age),
            gender: Patch::from(self.gender),
            weight: Patch::from(self.weight),
            height: Patch::from(self.height),
            medical_history: Patch::from(self.medical_history),
        };
        (self.id, update)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cfg = Arc::new(CoreConfig::new(cli.data_file)?);
    let service = PatientService::new(cfg);

    match cli.command {
        Some(Commands::Init) => {
            if service.store().initialise()? {
                println!(
                    "Initialised patient data file: {}",
                    service.store().path().display()
                );
            } else {
                println!(
                    "Patient data file already exists: {}",
                    service.store().path().display()
                );
            }
        }
        Some(Commands::List) => {
            let patients = service.fetch_all()?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                println!("{}", serde_json::to_string_pretty(&patients)?);
            }
        }
        Some(Commands::Show { id }) => {
            let patient = service.fetch_one(&id)?;
            println!("{}", serde_json::to_string_pretty(&patient)?);
        }
        Some(Commands::Sort { sort_by, order }) => {
            let patients = service.sorted(&sort_by, order.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&patients)?);
        }
        Some(Commands::Create(args)) => {
            let patient = service.create(args.into())?;
            println!(
                "Created patient {} (BMI {:.2})",
                patient.id(),
                patient.bmi()
            );
        }
        Some(Commands::Update(args)) => {
            let (id, update) = args.into_parts();
            if update.is_empty() {
                println!("Nothing to update for patient {}", id);
                return Ok(());
            }
            let patient = service.update(&id, update)?;
            println!(
                "Updated patient {} (BMI {:.2})",
                patient.id(),
                patient.bmi()
            );
        }
        Some(Commands::Delete { id }) => {
            service.delete(&id)?;
            println!("Deleted patient {}", id);
        }
        None => {
            println!("Use 'pms --help' for commands");
        }
    }

    Ok(())
}
