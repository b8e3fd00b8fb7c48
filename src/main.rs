use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use paperpress::auth::LocalAuth;
use paperpress::editor::Editor;
use paperpress::generation::HttpGenerationClient;
use paperpress::model::User;
use paperpress::store::FileStore;
use paperpress::{DirectorySaver, FontSet, LayoutOptions, PageGeometry, Paper, TitleLines};

#[derive(Parser)]
#[command(name = "paperpress", version, about = "Render research papers to paginated PDF")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct LayoutArgs {
    /// Page width in millimetres
    #[arg(long, default_value_t = 210.0)]
    page_width: f32,
    /// Page height in millimetres
    #[arg(long, default_value_t = 297.0)]
    page_height: f32,
    /// Margin on every side in millimetres
    #[arg(long, default_value_t = 25.0)]
    margin: f32,
    /// Title font size in points
    #[arg(long, default_value_t = 24.0)]
    title_size: f32,
    /// Section heading font size in points
    #[arg(long, default_value_t = 14.0)]
    heading_size: f32,
    /// Body font size in points
    #[arg(long, default_value_t = 11.0)]
    body_size: f32,
    /// Only render the first line of a wrapped title
    #[arg(long)]
    first_line_title: bool,
    /// TrueType/OpenType font for body text
    #[arg(long, env = "PAPERPRESS_FONT")]
    font: Option<PathBuf>,
    /// TrueType/OpenType font for titles and headings
    #[arg(long, env = "PAPERPRESS_BOLD_FONT")]
    bold_font: Option<PathBuf>,
}

impl LayoutArgs {
    fn geometry(&self) -> PageGeometry {
        PageGeometry {
            page_width: self.page_width,
            page_height: self.page_height,
            margin: self.margin,
            title_font_size: self.title_size,
            section_heading_font_size: self.heading_size,
            body_font_size: self.body_size,
        }
    }

    fn options(&self) -> LayoutOptions {
        LayoutOptions {
            title_lines: if self.first_line_title {
                TitleLines::FirstLineOnly
            } else {
                TitleLines::AllCentered
            },
            ..LayoutOptions::default()
        }
    }

    fn fonts(&self) -> paperpress::Result<FontSet> {
        FontSet::load(self.font.as_deref(), self.bold_font.as_deref())
    }
}

#[derive(Args)]
struct StoreArgs {
    /// Directory holding stored papers
    #[arg(long, env = "PAPERPRESS_STORE", default_value = "papers")]
    store: PathBuf,
    /// Signed-in user id
    #[arg(long, env = "PAPERPRESS_USER")]
    user: Option<String>,
    /// Generation service base URL
    #[arg(long, env = "PAPERPRESS_API_URL", default_value = paperpress::generation::DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Subcommand)]
enum Command {
    /// Render a paper JSON file and save it as <title-slug>.pdf
    Render {
        #[arg(value_name = "PAPER")]
        input: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Print the page layout of a paper JSON file
    Layout {
        #[arg(value_name = "PAPER")]
        input: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Generate a paper for a topic and store it
    Generate {
        topic: String,
        /// Paper title; defaults to the topic
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Manage stored papers
    Store {
        #[command(subcommand)]
        action: StoreAction,
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// List papers, most recently modified first
    List,
    /// Print a stored paper as JSON
    Show { paper_id: String },
    /// Store a paper JSON file
    Import { input: PathBuf },
    /// Delete a stored paper
    Delete { paper_id: String },
    /// Render a stored paper to PDF
    Export {
        paper_id: String,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

fn editor(args: &StoreArgs) -> paperpress::Result<Editor<FileStore, LocalAuth, HttpGenerationClient>> {
    let auth = LocalAuth::new();
    if let Some(id) = &args.user {
        auth.sign_in(User {
            id: id.clone(),
            email: format!("{id}@localhost"),
            display_name: None,
        });
    }
    Ok(Editor::new(
        FileStore::new(&args.store),
        auth,
        HttpGenerationClient::new(&args.api_url)?,
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> paperpress::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> paperpress::Result<()> {
    match cli.command {
        Command::Render {
            input,
            output,
            layout,
        } => {
            let path = paperpress::convert_paper_json_to_pdf(
                &input,
                &output,
                &layout.geometry(),
                &layout.options(),
                &layout.fonts()?,
            )?;
            println!("{}", path.display());
        }
        Command::Layout { input, layout } => {
            let paper: Paper = serde_json::from_slice(&std::fs::read(&input)?)?;
            let sections = paper.ordered_sections();
            let doc = paperpress::render_with(
                &paper,
                &sections,
                &layout.geometry(),
                &layout.options(),
                &layout.fonts()?,
            )?;
            print_json(&doc)?;
        }
        Command::Generate { topic, title, store } => {
            let paper = editor(&store)?.generate_paper(&topic, title.as_deref())?;
            println!("{}", paper.id);
        }
        Command::Store { action, store } => {
            let editor = editor(&store)?;
            match action {
                StoreAction::List => {
                    for paper in editor.list_papers()? {
                        println!(
                            "{}\t{}\t{}",
                            paper.id,
                            paper.last_modified.format("%Y-%m-%d %H:%M"),
                            paper.title
                        );
                    }
                }
                StoreAction::Show { paper_id } => print_json(&editor.load(&paper_id)?)?,
                StoreAction::Import { input } => {
                    let paper: Paper = serde_json::from_slice(&std::fs::read(&input)?)?;
                    println!("{}", editor.import_paper(paper)?.id);
                }
                StoreAction::Delete { paper_id } => editor.delete_paper(&paper_id)?,
                StoreAction::Export {
                    paper_id,
                    output,
                    layout,
                } => {
                    let editor = editor
                        .with_fonts(layout.fonts()?)
                        .with_options(layout.options());
                    let mut saver = DirectorySaver::new(&output);
                    editor.download(&paper_id, &layout.geometry(), &mut saver)?;
                    for path in saver.saved() {
                        println!("{}", path.display());
                    }
                }
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
