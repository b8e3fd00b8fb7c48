mod common;

use std::sync::{Arc, Mutex};

use common::{FakeGenerator, RecordingSaver};
use paperpress::auth::{AuthProvider, LocalAuth};
use paperpress::editor::Editor;
use paperpress::generation::{PAPER_SECTIONS, WritingAspect};
use paperpress::layout::BlockKind;
use paperpress::model::User;
use paperpress::store::{DocumentStore, MemoryStore, PaperUpdate, SectionUpdate};
use paperpress::{Error, PageGeometry};

fn signed_in(generator: FakeGenerator) -> Editor<MemoryStore, LocalAuth, FakeGenerator> {
    Editor::new(
        MemoryStore::new(),
        LocalAuth::signed_in(common::user("u1")),
        generator,
    )
}

#[test]
fn auth_listeners_see_every_change() {
    let auth = LocalAuth::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    auth.subscribe(Box::new(move |user: Option<&User>| {
        sink.lock().unwrap().push(user.map(|u| u.id.clone()));
    }));

    assert!(auth.current_user().is_none());
    assert!(matches!(auth.require_user(), Err(Error::Unauthenticated)));
    auth.sign_in(common::user("a"));
    assert_eq!(auth.require_user().unwrap().id, "a");
    auth.sign_out();
    auth.sign_in(common::user("b"));

    assert_eq!(
        *seen.lock().unwrap(),
        [Some("a".to_string()), None, Some("b".to_string())]
    );
}

#[test]
fn every_operation_requires_a_user() {
    let editor = Editor::new(MemoryStore::new(), LocalAuth::new(), FakeGenerator::complete());
    let geometry = PageGeometry::a4();
    assert!(matches!(editor.create_paper("t", "a"), Err(Error::Unauthenticated)));
    assert!(matches!(editor.list_papers(), Err(Error::Unauthenticated)));
    assert!(matches!(editor.load("x"), Err(Error::Unauthenticated)));
    assert!(matches!(editor.preview("x", &geometry), Err(Error::Unauthenticated)));
    assert!(matches!(editor.generate_paper("topic", None), Err(Error::Unauthenticated)));
    let mut saver = RecordingSaver::default();
    assert!(matches!(
        editor.download("x", &geometry, &mut saver),
        Err(Error::Unauthenticated)
    ));
    assert!(saver.files.is_empty());
}

#[test]
fn sign_out_hides_papers() {
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.create_paper("Mine", "").expect("create");
    assert_eq!(editor.list_papers().expect("list").len(), 1);

    editor.auth().sign_out();
    assert!(matches!(editor.load(&paper.id), Err(Error::Unauthenticated)));

    editor.auth().sign_in(common::user("someone-else"));
    assert!(editor.list_papers().expect("list").is_empty());
    assert!(matches!(editor.load(&paper.id), Err(Error::NotFound(_))));
}

#[test]
fn section_and_citation_editing() {
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.create_paper("Edited", "abs").expect("create");

    let late = editor.add_section(&paper.id, "Late", "second", 2).expect("add");
    let early = editor.add_section(&paper.id, "Early", "first", 1).expect("add");
    editor
        .update_section(&paper.id, &late.id, SectionUpdate::content("second, revised"))
        .expect("update section");

    let doc = editor.preview(&paper.id, &PageGeometry::a4()).expect("preview");
    let texts: Vec<_> = doc.blocks().skip(3).map(|b| b.text()).collect();
    assert_eq!(texts, ["Early", "first", "Late", "second, revised"]);

    editor.delete_section(&paper.id, &early.id).expect("delete section");
    assert!(matches!(
        editor.update_section(&paper.id, &early.id, SectionUpdate::content("gone")),
        Err(Error::NotFound(_))
    ));

    let cited = editor
        .add_citation(&paper.id, common::citation("Prior Work"))
        .expect("add citation");
    assert!(!cited.id.is_empty());
    let with_citations = editor.fetch_citations(&paper.id, "Topic").expect("fetch");
    assert_eq!(with_citations.citations.len(), 2);
    let after = editor.delete_citation(&paper.id, &cited.id).expect("delete citation");
    assert_eq!(after.citations.len(), 1);
    assert_eq!(after.citations[0].title, "Topic");

    editor.delete_paper(&paper.id).expect("delete paper");
    assert!(matches!(editor.load(&paper.id), Err(Error::NotFound(_))));
}

#[test]
fn section_title_and_order_updates_reorder_the_preview() {
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.create_paper("Reordered", "abs").expect("create");
    let first = editor.add_section(&paper.id, "Methods", "how", 1).expect("add");
    editor.add_section(&paper.id, "Results", "what", 2).expect("add");

    let updated = editor
        .update_section(
            &paper.id,
            &first.id,
            SectionUpdate {
                title: Some("Methodology".to_string()),
                order: Some(3),
                ..Default::default()
            },
        )
        .expect("update section");
    let moved = updated.sections.iter().find(|s| s.id == first.id).expect("section");
    assert_eq!(moved.content, "how", "content is kept when not updated");

    let doc = editor.preview(&paper.id, &PageGeometry::a4()).expect("preview");
    let texts: Vec<_> = doc.blocks().skip(3).map(|b| b.text()).collect();
    assert_eq!(texts, ["Results", "what", "Methodology", "how"]);
}

#[test]
fn citation_updates_keep_the_id() {
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.create_paper("Cited", "").expect("create");
    let cited = editor
        .add_citation(&paper.id, common::citation("Draft Title"))
        .expect("add citation");

    let mut revised = common::citation("Final Title");
    revised.id = "ignored".to_string();
    revised.year = "2021".to_string();
    let updated = editor
        .update_citation(&paper.id, &cited.id, revised)
        .expect("update citation");
    assert_eq!(updated.citations.len(), 1);
    assert_eq!(updated.citations[0].id, cited.id);
    assert_eq!(updated.citations[0].title, "Final Title");
    assert_eq!(updated.citations[0].year, "2021");

    assert!(matches!(
        editor.update_citation(&paper.id, "missing", common::citation("x")),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn generate_paper_stores_ordered_sections() {
    common::init_logging();
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.generate_paper("Graph Neural Networks", None).expect("generate");

    assert_eq!(paper.title, "Graph Neural Networks");
    assert_eq!(paper.r#abstract, "We study things.");
    let titles: Vec<_> = paper.ordered_sections().into_iter().map(|s| s.title).collect();
    assert_eq!(titles, PAPER_SECTIONS[1..]);
    assert_eq!(paper.sections[0].order, 1);

    let stored = editor.load(&paper.id).expect("load");
    assert_eq!(stored, paper);
}

#[test]
fn generate_paper_prefers_an_explicit_title() {
    let editor = signed_in(FakeGenerator::complete());
    let titled = editor
        .generate_paper("graph learning", Some("  Message Passing at Scale "))
        .expect("generate");
    assert_eq!(titled.title, "Message Passing at Scale");
    assert_eq!(editor.generator().topics.borrow().as_slice(), ["graph learning"]);

    let blank = editor.generate_paper("graph learning", Some("   ")).expect("generate");
    assert_eq!(blank.title, "graph learning");
}

#[test]
fn generate_paper_reports_missing_abstract() {
    let mut generator = FakeGenerator::complete();
    generator.paper.r#abstract = " \n".to_string();
    let editor = signed_in(generator);
    let err = editor.generate_paper("Topic", None).unwrap_err();
    assert_eq!(err.to_string(), "Failed to generate paper abstract");
    assert!(editor.list_papers().expect("list").is_empty());
}

#[test]
fn generate_paper_reports_missing_section() {
    let mut generator = FakeGenerator::complete();
    generator.paper.methodology.clear();
    let editor = signed_in(generator);
    let err = editor.generate_paper("Topic", None).unwrap_err();
    assert_eq!(err.to_string(), "Failed to generate content for section: Methodology");
    assert!(editor.list_papers().expect("list").is_empty());
}

#[test]
fn generation_errors_pass_through() {
    let generator = FakeGenerator {
        failure: Some("Rate limit exceeded".to_string()),
        ..FakeGenerator::complete()
    };
    let editor = signed_in(generator);
    let err = editor.generate_paper("Topic", None).unwrap_err();
    assert_eq!(err.to_string(), "Rate limit exceeded");
}

#[test]
fn regenerate_section_appends_improved_text() {
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.create_paper("Regen", "The abstract.").expect("create");
    let section = editor.add_section(&paper.id, "Results", "Original.", 1).expect("add");

    let updated = editor
        .regenerate_section(&paper.id, &section.id, "  add a table  ")
        .expect("regenerate");
    assert_eq!(updated.sections[0].content, "Original.\n\nAdditional text.");

    let prompts = editor_prompts(&editor);
    assert_eq!(prompts.len(), 1);
    let (prompt, context) = &prompts[0];
    assert_eq!(prompt, "add a table");
    let context = context.as_ref().expect("context");
    assert_eq!(context.section_title.as_deref(), Some("Results"));
    assert_eq!(context.paper_title.as_deref(), Some("Regen"));
    assert_eq!(context.r#abstract.as_deref(), Some("The abstract."));
}

#[test]
fn blank_regenerate_prompt_is_a_no_op() {
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.create_paper("Regen", "").expect("create");
    let section = editor.add_section(&paper.id, "Results", "Original.", 1).expect("add");

    let unchanged = editor
        .regenerate_section(&paper.id, &section.id, " \n ")
        .expect("regenerate");
    assert_eq!(unchanged.sections[0].content, "Original.");
    assert!(editor_prompts(&editor).is_empty());
}

#[test]
fn improve_section_replaces_content() {
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.create_paper("Improve", "").expect("create");
    let section = editor.add_section(&paper.id, "Discussion", "rough draft", 1).expect("add");
    let empty = editor.add_section(&paper.id, "Empty", "", 2).expect("add");

    let updated = editor
        .improve_section(&paper.id, &section.id, WritingAspect::Clarity)
        .expect("improve");
    let improved = updated.sections.iter().find(|s| s.id == section.id).expect("section");
    assert_eq!(improved.content, "Additional text.");
    assert_eq!(editor_prompts(&editor)[0].0, "rough draft");

    editor
        .improve_section(&paper.id, &empty.id, WritingAspect::Clarity)
        .expect("improve empty");
    assert_eq!(editor_prompts(&editor).len(), 1, "empty sections are not sent");
}

#[test]
fn download_uses_stored_title() {
    let editor = signed_in(FakeGenerator::complete());
    let paper = editor.create_paper("Downloaded Paper", "").expect("create");
    editor
        .update(
            &paper.id,
            PaperUpdate {
                r#abstract: Some("Now with an abstract.".to_string()),
                ..Default::default()
            },
        )
        .expect("update");

    let mut saver = RecordingSaver::default();
    editor
        .download(&paper.id, &PageGeometry::a4(), &mut saver)
        .expect("download");
    assert_eq!(saver.files.len(), 1);
    assert_eq!(saver.files[0].0, "downloaded-paper.pdf");

    let doc = editor.preview(&paper.id, &PageGeometry::a4()).expect("preview");
    let body = doc.blocks().find(|b| b.kind == BlockKind::Body).expect("abstract body");
    assert_eq!(body.text(), "Now with an abstract.");
}

#[test]
fn import_assigns_owner_and_id() {
    let editor = signed_in(FakeGenerator::complete());
    let mut paper = common::paper("Imported", "");
    paper.id.clear();
    paper.owner_id = "someone-else".to_string();
    let stored = editor.import_paper(paper).expect("import");
    assert!(!stored.id.is_empty());
    assert_eq!(stored.owner_id, "u1");
    assert!(editor.store().get("u1", &stored.id).expect("get").is_some());
}

fn editor_prompts(
    editor: &Editor<MemoryStore, LocalAuth, FakeGenerator>,
) -> Vec<(String, Option<paperpress::generation::WritingContext>)> {
    editor.generator().prompts.borrow().clone()
}

#[test]
fn academic_aspect_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&WritingAspect::Academic).expect("json"),
        "\"academic\""
    );
}
