use clap::{Parser, Subcommand};
use clinic_core::annotation::render_strokes;
use clinic_core::codec::{decode_lab_tests, decode_medications};
use clinic_core::config::{
    canvas_dimension_from_env_value, color_from_env_value, data_dir_from_env_value,
    prescription_prefix_from_env_value,
};
use clinic_core::{
    CanvasSettings, CoreConfig, DepartmentDetails, DoctorDetails, Hospital, NonEmptyText,
    PatientDetails, PrescriptionAssembler, RegistryService, ShardableUuid, StorageMode,
    StoreBackend, Stroke,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic registry and prescription CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all hospitals
    ListHospitals,
    /// Add a hospital
    AddHospital {
        /// Hospital name
        name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// List the departments of a hospital
    ListDepartments {
        /// Hospital id
        hospital_id: String,
    },
    /// Add a department to a hospital
    AddDepartment {
        /// Hospital id
        hospital_id: String,
        /// Department name
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List the doctors of a department
    ListDoctors {
        /// Department id
        department_id: String,
    },
    /// Add a doctor to a department
    AddDoctor {
        /// Department id
        department_id: String,
        /// Doctor name
        name: String,
        #[arg(long, default_value = "")]
        specialization: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// List patients, optionally only those of one doctor
    ListPatients {
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Register a patient under a doctor; department and hospital follow the doctor
    AddPatient {
        /// Doctor id
        doctor_id: String,
        /// Patient name
        name: String,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long, default_value = "")]
        gender: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        blood_group: String,
    },
    /// List the prescriptions of a patient
    ListPrescriptions {
        /// Patient id
        patient_id: String,
    },
    /// Re-walk the reference chain of a stored patient or prescription
    Verify {
        /// Patient id
        #[arg(long, conflicts_with = "prescription")]
        patient: Option<String>,
        /// Prescription id
        #[arg(long)]
        prescription: Option<String>,
    },
    /// Decode medication text (`name|dosage|frequency|duration|instructions|quantity; ...`)
    DecodeMedications { text: String },
    /// Decode lab-test text (`name|instructions|urgency, ...`)
    DecodeLabTests { text: String },
    /// Render a JSON stroke list to a PNG file
    Render {
        /// JSON file holding an array of strokes
        strokes: PathBuf,
        /// Output PNG path
        output: PathBuf,
    },
    /// Write a prescription's handwritten annotation to a PNG file
    ExportAnnotation {
        /// Prescription id
        prescription_id: String,
        /// Output PNG path
        output: PathBuf,
    },
}

fn load_config() -> anyhow::Result<CoreConfig> {
    let env = |key: &str| std::env::var(key).ok();
    let defaults = CanvasSettings::default();
    let canvas = CanvasSettings {
        width: canvas_dimension_from_env_value(env("CLINIC_CANVAS_WIDTH"), defaults.width)?,
        height: canvas_dimension_from_env_value(env("CLINIC_CANVAS_HEIGHT"), defaults.height)?,
        background: color_from_env_value(env("CLINIC_CANVAS_BACKGROUND"), defaults.background)?,
        ..defaults
    };
    Ok(CoreConfig::new(
        data_dir_from_env_value(env("CLINIC_DATA_DIR")),
        StorageMode::Yaml,
        canvas,
        prescription_prefix_from_env_value(env("CLINIC_RX_PREFIX")),
    )?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("No command given; try --help.");
        return Ok(());
    };

    let cfg = Arc::new(load_config()?);
    let store = Arc::new(cfg.open_store());
    let registry = RegistryService::<StoreBackend>::new(store.clone());
    let assembler = PrescriptionAssembler::new(cfg.clone(), store);

    match command {
        Commands::ListHospitals => {
            let hospitals = registry.list_hospitals()?;
            if hospitals.is_empty() {
                println!("No hospitals found.");
            }
            for h in hospitals {
                println!("ID: {}, Name: {}, Created: {}", h.id, h.data.name, h.created_at);
            }
        }
        Commands::AddHospital {
            name,
            address,
            phone,
        } => {
            let stored = registry.create_hospital(Hospital {
                name: NonEmptyText::new(&name)?,
                address,
                phone,
            })?;
            println!("Created hospital with ID: {}", stored.id);
        }
        Commands::ListDepartments { hospital_id } => {
            for d in registry.departments_of(&ShardableUuid::parse(&hospital_id)?)? {
                println!("ID: {}, Name: {}", d.id, d.data.details.name);
            }
        }
        Commands::AddDepartment {
            hospital_id,
            name,
            description,
        } => {
            let stored = registry.create_department(
                &ShardableUuid::parse(&hospital_id)?,
                DepartmentDetails {
                    name: NonEmptyText::new(&name)?,
                    description,
                },
            )?;
            println!("Created department with ID: {}", stored.id);
        }
        Commands::ListDoctors { department_id } => {
            for d in registry.doctors_of(&ShardableUuid::parse(&department_id)?)? {
                println!(
                    "ID: {}, Name: {}, Specialization: {}",
                    d.id, d.data.details.name, d.data.details.specialization
                );
            }
        }
        Commands::AddDoctor {
            department_id,
            name,
            specialization,
            phone,
            email,
        } => {
            let stored = registry.create_doctor(
                &ShardableUuid::parse(&department_id)?,
                DoctorDetails {
                    name: NonEmptyText::new(&name)?,
                    specialization,
                    phone,
                    email,
                },
            )?;
            println!("Created doctor with ID: {}", stored.id);
        }
        Commands::ListPatients { doctor } => {
            let patients = match doctor {
                Some(doctor) => registry.patients_of(&ShardableUuid::parse(&doctor)?)?,
                None => registry.list_patients()?,
            };
            if patients.is_empty() {
                println!("No patients found.");
            }
            for p in patients {
                println!(
                    "ID: {}, Name: {}, Doctor: {}, Created: {}",
                    p.id, p.data.details.name, p.data.doctor_id, p.created_at
                );
            }
        }
        Commands::AddPatient {
            doctor_id,
            name,
            age,
            gender,
            phone,
            address,
            blood_group,
        } => {
            let stored = registry.create_patient(
                &ShardableUuid::parse(&doctor_id)?,
                PatientDetails {
                    name: NonEmptyText::new(&name)?,
                    age,
                    gender,
                    phone,
                    address,
                    blood_group,
                },
            )?;
            println!(
                "Registered patient {} (department {}, hospital {})",
                stored.id, stored.data.department_id, stored.data.hospital_id
            );
        }
        Commands::ListPrescriptions { patient_id } => {
            for rx in assembler.for_patient(&ShardableUuid::parse(&patient_id)?)? {
                println!(
                    "ID: {}, Number: {}, Medications: {}, Created: {}",
                    rx.id,
                    rx.data.number,
                    rx.data.content.medications.len(),
                    rx.created_at
                );
            }
        }
        Commands::Verify {
            patient,
            prescription,
        } => match (patient, prescription) {
            (Some(id), _) => {
                registry.verify_patient(&ShardableUuid::parse(&id)?)?;
                println!("Patient {} chain is consistent.", id);
            }
            (None, Some(id)) => {
                assembler.verify(&ShardableUuid::parse(&id)?)?;
                println!("Prescription {} chain is consistent.", id);
            }
            (None, None) => anyhow::bail!("pass --patient or --prescription"),
        },
        Commands::DecodeMedications { text } => print_json(&decode_medications(&text))?,
        Commands::DecodeLabTests { text } => print_json(&decode_lab_tests(&text))?,
        Commands::Render { strokes, output } => {
            let raw = std::fs::read_to_string(&strokes)?;
            let strokes: Vec<Stroke> = serde_json::from_str(&raw)?;
            let canvas = cfg.canvas();
            render_strokes(&strokes, canvas.width, canvas.height, canvas.background)
                .save(&output)?;
            println!("Rendered {} stroke(s) to {}", strokes.len(), output.display());
        }
        Commands::ExportAnnotation {
            prescription_id,
            output,
        } => {
            let rx = assembler.get(&ShardableUuid::parse(&prescription_id)?)?;
            match rx.data.annotation.decode()? {
                Some(image) => {
                    image.save(&output)?;
                    println!("Wrote annotation to {}", output.display());
                }
                None => println!("Prescription {} has no annotation.", rx.data.number),
            }
        }
    }

    Ok(())
}
