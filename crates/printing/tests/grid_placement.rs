use std::fs;
use std::path::PathBuf;

use labelkit_address::{Address, AddressRecord};
use labelkit_printing::{
    cell_origin, grid_position, mm, pages_required, FormatKind, LabelEntry, LabelFormatId,
    LabelGenerator, LayoutOptions,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GridFixture {
    format: String,
    labels: usize,
    pages: usize,
    placements: Vec<Placement>,
}

#[derive(Debug, Deserialize)]
struct Placement {
    index: usize,
    page: usize,
    row: usize,
    column: usize,
    x_mm: f32,
    y_mm: f32,
}

fn load_fixture() -> GridFixture {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/grid_14up.ron");
    let text = fs::read_to_string(&path).expect("read grid fixture");
    ron::from_str(&text).expect("parse grid fixture")
}

fn address(index: usize) -> Address {
    Address::try_from(AddressRecord {
        recipient: None,
        street: format!("Rua {index}"),
        number: index.to_string(),
        complement: None,
        district: "Centro".into(),
        city: "Recife".into(),
        state: "PE".into(),
        cep: "50010-000".into(),
    })
    .expect("valid address")
}

#[test]
fn grid_positions_match_fixture() {
    let fixture = load_fixture();
    let format = LabelFormatId::parse(&fixture.format).unwrap().format();
    let FormatKind::MultiUp { sheet, grid } = format.kind else {
        panic!("{} is not a multi-up format", fixture.format);
    };

    assert_eq!(pages_required(fixture.labels, grid.per_page()), fixture.pages);

    for placement in &fixture.placements {
        let position = grid_position(&grid, placement.index);
        assert_eq!(
            (position.page, position.row, position.column),
            (placement.page, placement.row, placement.column),
            "label {}",
            placement.index
        );
        let origin = cell_origin(&grid, format.size, sheet, position);
        assert!(
            (origin.x - mm(placement.x_mm)).abs() < 1e-2,
            "label {} x = {}",
            placement.index,
            origin.x
        );
        assert!(
            (origin.y - mm(placement.y_mm)).abs() < 1e-2,
            "label {} y = {}",
            placement.index,
            origin.y
        );
    }
}

#[test]
fn generated_pages_follow_fixture() {
    let fixture = load_fixture();
    let entries: Vec<LabelEntry> = (0..fixture.labels)
        .map(|index| LabelEntry::new(format!("Cliente {index}"), address(index)))
        .collect();

    let result = LabelGenerator::default()
        .layout(&fixture.format, &entries, LayoutOptions::default())
        .unwrap();

    assert_eq!(result.pages.len(), fixture.pages);
    assert_eq!(result.pages[0].labels, (0..14).collect::<Vec<_>>());
    assert_eq!(result.pages[1].labels, (14..20).collect::<Vec<_>>());
    assert!(result.warnings.is_empty());

    // the first text run on the second sheet belongs to label 14 in cell (0, 0)
    let first = result.pages[1].display_list.texts().next().unwrap();
    assert_eq!(first.text, "CLIENTE 14");
    assert!((first.position.x - mm(6.35 + 3.0)).abs() < 1e-2);
    assert!(first.position.y < mm(297.0 - 12.7));
    assert!(first.position.y > mm(246.2));
}
