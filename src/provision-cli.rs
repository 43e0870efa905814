//! A simple CLI tool for provisioning the voting database.
//! All the write paths the server deliberately does not expose live here:
//! schema setup, admin accounts, voter accounts, and candidates.
//! Every subcommand is idempotent, so re-running a provisioning script is safe.

use clap::{Arg, ArgAction, ArgMatches, Command};
use mongodb::{bson::doc, Client, Database};

use staffvote_backend::config::database_name;
use staffvote_backend::error::Error;
use staffvote_backend::model::{
    api::auth::Credentials,
    db::{
        candidate::{Candidate, CandidateCore, NewCandidate},
        user::{NewUser, Role, User, UserCore},
    },
    mongodb::{
        ensure_counters_exist, ensure_indexes_exist, Coll, Counter, CANDIDATE_ID_COUNTER,
        USER_ID_COUNTER,
    },
};

const PROGRAM_NAME: &str = "provision-staffvote";

const ABOUT_TEXT: &str = "Provision the staff vote database.

EXIT CODES:
     0: Ran successfully.
 Other: Error.";

const DB_URI: &str = "db-uri";
const DB_URI_HELP: &str = "MongoDB connection string";

const USERNAME: &str = "username";
const PASSWORD: &str = "password";
const ROLE: &str = "role";
const FORCE: &str = "force";
const NAME: &str = "name";
const DEPARTMENT: &str = "department";

const ADMIN_PASSWORD_VAR: &str = "ADMIN_PASSWORD";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .arg(
            Arg::new(DB_URI)
                .long(DB_URI)
                .help(DB_URI_HELP)
                .action(ArgAction::Set)
                .global(true)
                .default_value("mongodb://localhost:27017"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the collection indexes and ID counters if they do not exist"),
        )
        .subcommand(
            Command::new("setup-admin")
                .about(format!(
                    "Create an admin account, reading the password from \
                     the {ADMIN_PASSWORD_VAR} environment variable"
                ))
                .arg(
                    Arg::new(USERNAME)
                        .long(USERNAME)
                        .help("Username for the admin account")
                        .action(ArgAction::Set)
                        .required(true),
                )
                .arg(
                    Arg::new(FORCE)
                        .long(FORCE)
                        .help("Reset the password and role if the account already exists")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("add-user")
                .about("Create a voter account; does nothing if the username is taken")
                .arg(
                    Arg::new(USERNAME)
                        .long(USERNAME)
                        .help("Username for the account")
                        .action(ArgAction::Set)
                        .required(true),
                )
                .arg(
                    Arg::new(PASSWORD)
                        .long(PASSWORD)
                        .help("Password for the account")
                        .action(ArgAction::Set)
                        .required(true),
                )
                .arg(
                    Arg::new(ROLE)
                        .long(ROLE)
                        .help("Role for the account")
                        .action(ArgAction::Set)
                        .value_parser(["employee", "admin"])
                        .default_value("employee"),
                ),
        )
        .subcommand(
            Command::new("add-candidate")
                .about("Register a candidate; does nothing if the name is taken")
                .arg(
                    Arg::new(NAME)
                        .long(NAME)
                        .help("The candidate's name")
                        .action(ArgAction::Set)
                        .required(true),
                )
                .arg(
                    Arg::new(DEPARTMENT)
                        .long(DEPARTMENT)
                        .help("The candidate's department")
                        .action(ArgAction::Set),
                ),
        )
}

/// Connect to the database and make sure the schema is in place.
///
/// Every subcommand starts here, so `init` on its own is only needed when
/// bringing up a database without provisioning any data yet.
async fn connect(args: &ArgMatches) -> Result<Database, Error> {
    let uri: &String = args.get_one(DB_URI).unwrap(); // Defaulted argument is guaranteed to be present.
    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&database_name());
    ensure_indexes_exist(&db).await?;
    ensure_counters_exist(&Coll::from_db(&db)).await?;
    Ok(db)
}

/// Look up a user by username.
async fn user_by_username(db: &Database, username: &str) -> Result<Option<User>, Error> {
    let user = Coll::<User>::from_db(db)
        .find_one(doc! { "username": username }, None)
        .await?;
    Ok(user)
}

/// Create a user with the given role, allocating their integer identity.
async fn insert_user(db: &Database, credentials: &Credentials, role: Role) -> Result<(), Error> {
    let user_id = Counter::next(&Coll::from_db(db), USER_ID_COUNTER).await?;
    let user = UserCore::new(user_id, credentials, role).ok_or_else(|| {
        Error::BadRequest("Username must be non-empty and password at least 8 characters".into())
    })?;
    Coll::<NewUser>::from_db(db).insert_one(user, None).await?;
    Ok(())
}

async fn setup_admin(db: &Database, args: &ArgMatches) -> Result<(), Error> {
    let username: &String = args.get_one(USERNAME).unwrap();
    let password = std::env::var(ADMIN_PASSWORD_VAR)
        .map_err(|_| Error::BadRequest(format!("{ADMIN_PASSWORD_VAR} is not set")))?;
    let credentials = Credentials {
        username: username.clone(),
        password,
    };

    if let Some(existing) = user_by_username(db, username).await? {
        if !args.get_flag(FORCE) {
            println!("User '{username}' already exists, nothing to do.");
            return Ok(());
        }
        // Keep the existing identity; just reset the password and role.
        let user = UserCore::new(existing.user_id, &credentials, Role::Admin).ok_or_else(|| {
            Error::BadRequest("Password must be at least 8 characters".into())
        })?;
        Coll::<User>::from_db(db)
            .update_one(
                doc! { "username": username },
                doc! { "$set": {
                    "password_hash": user.password_hash,
                    "role": "admin",
                }},
                None,
            )
            .await?;
        println!("Reset admin account '{username}'.");
        return Ok(());
    }

    insert_user(db, &credentials, Role::Admin).await?;
    println!("Created admin account '{username}'.");
    Ok(())
}

async fn add_user(db: &Database, args: &ArgMatches) -> Result<(), Error> {
    let username: &String = args.get_one(USERNAME).unwrap();
    let password: &String = args.get_one(PASSWORD).unwrap();
    let role = match args.get_one::<String>(ROLE).unwrap().as_str() {
        "admin" => Role::Admin,
        _ => Role::Employee,
    };

    if user_by_username(db, username).await?.is_some() {
        println!("User '{username}' already exists, nothing to do.");
        return Ok(());
    }

    let credentials = Credentials {
        username: username.clone(),
        password: password.clone(),
    };
    insert_user(db, &credentials, role).await?;
    println!("Created user '{username}'.");
    Ok(())
}

async fn add_candidate(db: &Database, args: &ArgMatches) -> Result<(), Error> {
    let name: &String = args.get_one(NAME).unwrap();
    let department: Option<&String> = args.get_one(DEPARTMENT);

    let existing = Coll::<Candidate>::from_db(db)
        .find_one(doc! { "name": name }, None)
        .await?;
    if existing.is_some() {
        println!("Candidate '{name}' already exists, nothing to do.");
        return Ok(());
    }

    let candidate_id = Counter::next(&Coll::from_db(db), CANDIDATE_ID_COUNTER).await?;
    let candidate = CandidateCore {
        candidate_id,
        name: name.clone(),
        department: department.cloned(),
    };
    Coll::<NewCandidate>::from_db(db)
        .insert_one(candidate, None)
        .await?;
    println!("Registered candidate '{name}' with ID {candidate_id}.");
    Ok(())
}

/// Run the selected subcommand, report the result, and return the exit code.
async fn run(args: &ArgMatches) -> u8 {
    let db = match connect(args).await {
        Ok(db) => db,
        Err(err) => {
            println!("Failed to reach the database: {err}");
            return 1;
        }
    };

    let result = match args.subcommand() {
        Some(("init", _)) => {
            // `connect` already did the work.
            println!("Indexes and counters are in place.");
            Ok(())
        }
        Some(("setup-admin", sub_args)) => setup_admin(&db, sub_args).await,
        Some(("add-user", sub_args)) => add_user(&db, sub_args).await,
        Some(("add-candidate", sub_args)) => add_candidate(&db, sub_args).await,
        _ => unreachable!("subcommand is required"),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            println!("Provisioning failed: {err}");
            1
        }
    }
}

#[rocket::main]
async fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args).await;
    std::process::exit(exit_code.into())
}
