// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use bookstudio_config::{Config, ConfigManager};
use clap::{Arg, ArgMatches, Command};
use std::path::{Path, PathBuf};

mod commands;

use commands::GenerateTarget;

fn book_id_arg() -> Arg {
    Arg::new("id").required(true).value_name("BOOK_ID").help("Book ID")
}

fn output_arg(help: &'static str) -> Arg {
    Arg::new("output").short('o').long("output").value_name("FILE").help(help)
}

fn build_cli() -> Command {
    Command::new("bookstudio")
        .version(env!("CARGO_PKG_VERSION"))
        .author("BookStudio Team")
        .about("Write books with a generative model: outline, synopsis, chapters and cover")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding the library (overrides storage.data_dir)")
                .global(true),
        )
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .global(true),
        )
        .subcommand(Command::new("list").about("List all books in the library"))
        .subcommand(
            Command::new("new")
                .about("Create a new book")
                .arg(Arg::new("title").short('t').long("title").value_name("TITLE").help("Book title (optional)"))
                .arg(Arg::new("premise").short('p').long("premise").value_name("PREMISE").help("Premise the outline is generated from (optional)")),
        )
        .subcommand(
            Command::new("show")
                .about("Show a book with its chapters")
                .arg(book_id_arg())
                .arg(Arg::new("json").long("json").help("Print the stored JSON record").action(clap::ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit the title, premise or synopsis of a book")
                .arg(book_id_arg())
                .arg(Arg::new("title").short('t').long("title").value_name("TITLE").help("New title"))
                .arg(Arg::new("premise").short('p').long("premise").value_name("PREMISE").help("New premise"))
                .arg(Arg::new("synopsis").short('s').long("synopsis").value_name("TEXT").help("New synopsis")),
        )
        .subcommand(
            Command::new("chapter")
                .about("Edit the title or summary of one chapter")
                .arg(book_id_arg())
                .arg(
                    Arg::new("number")
                        .required(true)
                        .value_name("NUMBER")
                        .help("Chapter number, starting at 1")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(Arg::new("title").short('t').long("title").value_name("TITLE").help("New chapter title"))
                .arg(Arg::new("summary").short('s').long("summary").value_name("TEXT").help("New chapter summary")),
        )
        .subcommand(
            Command::new("upload-cover")
                .about("Attach a reference image used to generate the cover")
                .arg(book_id_arg())
                .arg(Arg::new("image").required(true).value_name("IMAGE").help("PNG, JPEG or WebP file")),
        )
        .subcommand(
            Command::new("generate")
                .about("Run a generation step on a book")
                .subcommand_required(true)
                .subcommand(Command::new("outline").about("Generate the chapter outline from the premise").arg(book_id_arg()))
                .subcommand(Command::new("synopsis").about("Generate the synopsis from the outline").arg(book_id_arg()))
                .subcommand(Command::new("cover").about("Generate the cover from the uploaded image").arg(book_id_arg()))
                .subcommand(
                    Command::new("chapter")
                        .about("Write the content of one chapter")
                        .arg(book_id_arg())
                        .arg(
                            Arg::new("number")
                                .required(true)
                                .value_name("NUMBER")
                                .help("Chapter number, starting at 1")
                                .value_parser(clap::value_parser!(usize)),
                        ),
                )
                .subcommand(Command::new("chapters").about("Write every chapter that has no content yet").arg(book_id_arg())),
        )
        .subcommand(
            Command::new("export-md")
                .about("Export a book as Markdown")
                .arg(book_id_arg())
                .arg(output_arg("Output file path (defaults to <Title>.md)")),
        )
        .subcommand(
            Command::new("export-cover")
                .about("Export the generated cover as PNG")
                .arg(book_id_arg())
                .arg(output_arg("Output file path (defaults to <Title>_cover.png)")),
        )
        .subcommand(
            Command::new("export")
                .about("Export the whole library as JSON")
                .arg(output_arg("Output file path (defaults to ai_studio_library.json)")),
        )
        .subcommand(
            Command::new("import")
                .about("Replace the library with a previously exported JSON file")
                .arg(Arg::new("file").required(true).value_name("FILE").help("Library JSON file")),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or create the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file if none exists"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(Command::new("validate").about("Check the config file for invalid values"))
                .subcommand(Command::new("reset").about("Overwrite the config file with defaults")),
        )
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    let manager = match matches.get_one::<String>("config-dir") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate the configuration directory")
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.app.log_level.as_str()))
        .init();
}

fn data_dir(matches: &ArgMatches, config: &Config) -> Result<PathBuf> {
    match matches.get_one::<String>("data-dir") {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => ConfigManager::resolve_data_dir(config).context("Failed to determine the data directory"),
    }
}

fn book_id(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("id")
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow::anyhow!("Book ID is required"))
}

fn chapter_number(matches: &ArgMatches) -> Result<usize> {
    matches
        .get_one::<usize>("number")
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Chapter number is required"))
}

fn output_path(matches: &ArgMatches) -> Option<PathBuf> {
    matches.get_one::<String>("output").map(PathBuf::from)
}

fn opt<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches.get_one::<String>(name).map(|s| s.as_str())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = config_manager(&matches)?;

    if let Some(("config", sub_matches)) = matches.subcommand() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
        return match sub_matches.subcommand() {
            Some(("init", _)) => commands::config_init(&manager),
            Some(("show", _)) => commands::config_show(&manager),
            Some(("validate", _)) => commands::config_validate(&manager),
            Some(("reset", _)) => commands::config_reset(&manager),
            Some(("path", _)) => {
                println!("{}", manager.config_path().display());
                Ok(())
            }
            _ => {
                build_cli().print_help()?;
                Ok(())
            }
        };
    }

    let config = manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;
    init_logging(&config);

    let data_dir = data_dir(&matches, &config)?;
    let studio = commands::open_studio(&data_dir, &config)?;

    match matches.subcommand() {
        Some(("list", _)) => commands::list_books(&studio),
        Some(("new", sub_matches)) => {
            commands::new_book(&studio, opt(sub_matches, "title"), opt(sub_matches, "premise")).map(|_| ())
        }
        Some(("show", sub_matches)) => {
            commands::show_book(&studio, book_id(sub_matches)?, sub_matches.get_flag("json"))
        }
        Some(("edit", sub_matches)) => commands::edit_book(
            &studio,
            book_id(sub_matches)?,
            opt(sub_matches, "title"),
            opt(sub_matches, "premise"),
            opt(sub_matches, "synopsis"),
        ),
        Some(("chapter", sub_matches)) => commands::edit_chapter(
            &studio,
            book_id(sub_matches)?,
            chapter_number(sub_matches)?,
            opt(sub_matches, "title"),
            opt(sub_matches, "summary"),
        ),
        Some(("upload-cover", sub_matches)) => {
            let image = opt(sub_matches, "image").ok_or_else(|| anyhow::anyhow!("Image path is required"))?;
            commands::upload_cover(&studio, book_id(sub_matches)?, Path::new(image))
        }
        Some(("generate", sub_matches)) => {
            let (target, step_matches) = match sub_matches.subcommand() {
                Some(("outline", m)) => (GenerateTarget::Outline, m),
                Some(("synopsis", m)) => (GenerateTarget::Synopsis, m),
                Some(("cover", m)) => (GenerateTarget::Cover, m),
                Some(("chapter", m)) => (GenerateTarget::Chapter(chapter_number(m)?), m),
                Some(("chapters", m)) => (GenerateTarget::MissingChapters, m),
                _ => anyhow::bail!("Unknown generation step"),
            };
            commands::generate(&studio, book_id(step_matches)?, target).await
        }
        Some(("export-md", sub_matches)) => {
            commands::export_markdown(&studio, book_id(sub_matches)?, output_path(sub_matches)).map(|_| ())
        }
        Some(("export-cover", sub_matches)) => {
            commands::export_cover(&studio, book_id(sub_matches)?, output_path(sub_matches)).map(|_| ())
        }
        Some(("export", sub_matches)) => commands::export_library(&studio, output_path(sub_matches)).map(|_| ()),
        Some(("import", sub_matches)) => {
            let file = opt(sub_matches, "file").ok_or_else(|| anyhow::anyhow!("File path is required"))?;
            commands::import_library(&studio, Path::new(file))
        }
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_generate_chapter_parses_number() {
        let matches = build_cli()
            .try_get_matches_from(["bookstudio", "generate", "chapter", "abc", "2"])
            .unwrap();
        let (_, generate) = matches.subcommand().unwrap();
        let (name, chapter) = generate.subcommand().unwrap();
        assert_eq!(name, "chapter");
        assert_eq!(book_id(chapter).unwrap(), "abc");
        assert_eq!(chapter_number(chapter).unwrap(), 2);
    }

    #[test]
    fn test_global_data_dir_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["bookstudio", "list", "--data-dir", "/tmp/books"])
            .unwrap();
        let config = Config::default();
        assert_eq!(data_dir(&matches, &config).unwrap(), PathBuf::from("/tmp/books"));
    }

    #[test]
    fn test_book_id_help_names_no_format() {
        let help = book_id_arg().get_help().map(|h| h.to_string());
        assert_eq!(help.as_deref(), Some("Book ID"));
    }

    #[test]
    fn test_generate_requires_step() {
        let result = build_cli().try_get_matches_from(["bookstudio", "generate"]);
        assert!(result.is_err());
    }
}
