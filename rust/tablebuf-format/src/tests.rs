use tablebuf_common::ErrorKind;

use crate::{
    Builder, BuilderOptions, BytesItem, Offset, StrItem, Table, TableAccessor, TableItem, Vector,
    VerifierOptions,
    defs::settings::{
        document_2007::{DocumentSettingsModel, DocumentSettingsModelRef},
        presentation_2007::{
            PresentationPropertiesModel, PresentationPropertiesModelMut,
            PresentationPropertiesModelRef,
        },
    },
    root,
    verifier::{Verifiable, Verifier, verify_root},
};

/// Slots of the test table used throughout this module.
mod sample {
    pub const U8: usize = 0;
    pub const I16: usize = 1;
    pub const U32: usize = 2;
    pub const I64: usize = 3;
    pub const F32: usize = 4;
    pub const F64: usize = 5;
    pub const BOOL: usize = 6;
    pub const NAME: usize = 7;
    pub const INTS: usize = 8;
    pub const TAGS: usize = 9;
    pub const CHILDREN: usize = 10;
    pub const BLOB: usize = 11;
    pub const CONTENT_TYPE: usize = 12;
    pub const CONTENT: usize = 13;
    pub const NUM_FIELDS: usize = 14;

    pub const CONTENT_PRESENTATION: u8 = 1;
    pub const CONTENT_DOCUMENT: u8 = 2;
}

struct Sample;

impl Verifiable for Sample {
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> tablebuf_common::Result<()> {
        v.visit_table(pos)?
            .visit_field::<u8>("u8", sample::U8, false)?
            .visit_field::<i16>("i16", sample::I16, false)?
            .visit_field::<u32>("u32", sample::U32, false)?
            .visit_field::<i64>("i64", sample::I64, false)?
            .visit_field::<f32>("f32", sample::F32, false)?
            .visit_field::<f64>("f64", sample::F64, false)?
            .visit_field::<bool>("bool", sample::BOOL, false)?
            .visit_reference::<StrItem>("name", sample::NAME, false)?
            .visit_reference::<Vector<i32>>("ints", sample::INTS, false)?
            .visit_reference::<Vector<StrItem>>("tags", sample::TAGS, false)?
            .visit_reference::<Vector<TableItem<PresentationPropertiesModelRef>>>(
                "children",
                sample::CHILDREN,
                false,
            )?
            .visit_reference::<BytesItem>("blob", sample::BLOB, false)?
            .visit_union(
                "content",
                sample::CONTENT_TYPE,
                sample::CONTENT,
                false,
                |tag, v, pos| match tag {
                    sample::CONTENT_PRESENTATION => {
                        PresentationPropertiesModelRef::run_verifier(v, pos)
                    }
                    sample::CONTENT_DOCUMENT => DocumentSettingsModelRef::run_verifier(v, pos),
                    _ => Ok(()),
                },
            )?
            .finish();
        Ok(())
    }
}

fn build_sample(builder: &mut Builder) -> Offset<()> {
    let name = builder.create_string("sample").unwrap();
    let ints = builder.create_vector::<i32>(&[1, -2, 3, i32::MIN]).unwrap();
    let tags = builder.create_vector_of_strings(&["a", "bc", ""]).unwrap();
    let children = [true, false, true]
        .into_iter()
        .map(|is_in_memory| PresentationPropertiesModel::create(builder, is_in_memory).unwrap())
        .collect::<Vec<_>>();
    let children = builder.create_vector_of_offsets(&children).unwrap();
    let blob = builder.create_byte_vector(&[0, 0xff, 7]).unwrap();
    let content = PresentationPropertiesModel::create(builder, true).unwrap();

    builder.start_table(sample::NUM_FIELDS).unwrap();
    builder.add_field::<u8>(sample::U8, 200, 0).unwrap();
    builder.add_field::<i16>(sample::I16, -300, 0).unwrap();
    builder.add_field::<u32>(sample::U32, 0x0102_0304, 0).unwrap();
    builder.add_field::<i64>(sample::I64, i64::MIN + 1, 0).unwrap();
    builder.add_field::<f32>(sample::F32, 1.25, 0.0).unwrap();
    builder.add_field::<f64>(sample::F64, -2.5e100, 0.0).unwrap();
    builder.add_field::<bool>(sample::BOOL, true, false).unwrap();
    builder.add_offset(sample::NAME, name).unwrap();
    builder.add_offset(sample::INTS, ints).unwrap();
    builder.add_offset(sample::TAGS, tags).unwrap();
    builder.add_offset(sample::CHILDREN, children).unwrap();
    builder.add_offset(sample::BLOB, blob).unwrap();
    builder
        .add_union(
            sample::CONTENT_TYPE,
            sample::CONTENT,
            sample::CONTENT_PRESENTATION,
            content,
        )
        .unwrap();
    builder.end_table().unwrap()
}

#[test]
fn test_all_default_table_size() {
    let mut builder = Builder::new();
    let table = PresentationPropertiesModel::create(&mut builder, false).unwrap();
    builder.finish(table).unwrap();
    let data = builder.finished_data().unwrap();
    // Root offset, a header-only vtable and the table's soffset.
    assert_eq!(data.len(), 4 + 4 + 4);
    let model = PresentationPropertiesModelRef::from_root(data).unwrap();
    assert!(!model.is_in_memory().unwrap());
    assert_eq!(model.as_table().vtable().unwrap().num_slots(), 0);

    let mut builder = Builder::new();
    let table = DocumentSettingsModel::create(&mut builder).unwrap();
    builder.finish(table).unwrap();
    let data = builder.finished_data().unwrap();
    assert_eq!(data.len(), 12);
    let model = DocumentSettingsModelRef::from_root(data).unwrap();
    assert_eq!(DocumentSettingsModel::try_from(model).unwrap(), DocumentSettingsModel {});
}

#[test]
fn test_round_trip() {
    let mut builder = Builder::new();
    let table = build_sample(&mut builder);
    builder.finish(table).unwrap();
    let data = builder.finished_data().unwrap();
    verify_root::<Sample>(data, &VerifierOptions::default()).unwrap();

    let table = root::<Table>(data).unwrap();
    assert_eq!(table.get::<u8>(sample::U8, 0).unwrap(), 200);
    assert_eq!(table.get::<i16>(sample::I16, 0).unwrap(), -300);
    assert_eq!(table.get::<u32>(sample::U32, 0).unwrap(), 0x0102_0304);
    assert_eq!(table.get::<i64>(sample::I64, 0).unwrap(), i64::MIN + 1);
    assert_eq!(table.get::<f32>(sample::F32, 0.0).unwrap(), 1.25);
    assert_eq!(table.get::<f64>(sample::F64, 0.0).unwrap(), -2.5e100);
    assert!(table.get::<bool>(sample::BOOL, false).unwrap());
    assert_eq!(table.get_str(sample::NAME).unwrap(), Some("sample"));

    let ints: Vector<i32> = table.get_vector(sample::INTS).unwrap().unwrap();
    assert_eq!(ints.to_vec().unwrap(), vec![1, -2, 3, i32::MIN]);

    let tags: Vector<StrItem> = table.get_vector(sample::TAGS).unwrap().unwrap();
    assert_eq!(tags.to_vec().unwrap(), vec!["a", "bc", ""]);

    let children: Vector<TableItem<PresentationPropertiesModelRef>> =
        table.get_vector(sample::CHILDREN).unwrap().unwrap();
    let flags = children
        .iter()
        .map(|child| child.and_then(|c| c.is_in_memory()))
        .collect::<tablebuf_common::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(flags, vec![true, false, true]);

    assert_eq!(table.get_bytes(sample::BLOB).unwrap(), Some(&[0, 0xff, 7][..]));
    let blob: Vector<u8> = table.get_vector(sample::BLOB).unwrap().unwrap();
    assert_eq!(blob.as_bytes(), &[0, 0xff, 7]);

    let content = table
        .get_union(sample::CONTENT_TYPE, sample::CONTENT)
        .unwrap()
        .unwrap();
    assert_eq!(content.tag(), sample::CONTENT_PRESENTATION);
    assert!(
        content
            .as_table::<DocumentSettingsModelRef>(sample::CONTENT_DOCUMENT)
            .is_none()
    );
    let content = content
        .as_table::<PresentationPropertiesModelRef>(sample::CONTENT_PRESENTATION)
        .unwrap();
    assert!(content.is_in_memory().unwrap());
}

#[test]
fn test_absent_fields_read_in_any_order() {
    let mut builder = Builder::new();
    builder.start_table(sample::NUM_FIELDS).unwrap();
    builder.add_field::<u32>(sample::U32, 5, 0).unwrap();
    let table = builder.end_table::<()>().unwrap();
    builder.finish(table).unwrap();
    let data = builder.finished_data().unwrap();
    let table = root::<Table>(data).unwrap();

    let mut slots = (0..sample::NUM_FIELDS + 4).collect::<Vec<_>>();
    for pass in 0..2 {
        if pass == 1 {
            slots.reverse();
        }
        for &slot in &slots {
            if slot == sample::U32 {
                assert_eq!(table.get::<u32>(slot, 9).unwrap(), 5);
            } else {
                assert_eq!(table.get::<u32>(slot, 9).unwrap(), 9);
                assert_eq!(table.get_str(slot).unwrap(), None);
                assert!(table.get_vector::<u8>(slot).unwrap().is_none());
            }
        }
    }
    assert!(
        table
            .get_union(sample::CONTENT_TYPE, sample::CONTENT)
            .unwrap()
            .is_none()
    );
}

fn child_vtable_positions(data: &[u8]) -> Vec<usize> {
    let table = root::<Table>(data).unwrap();
    let children: Vector<TableItem<PresentationPropertiesModelRef>> =
        table.get_vector(sample::CHILDREN).unwrap().unwrap();
    let mut positions = children
        .iter()
        .map(|c| c.unwrap().as_table().vtable().unwrap().position())
        .collect::<Vec<_>>();
    positions.sort_unstable();
    positions.dedup();
    positions
}

fn build_children(builder: &mut Builder, flags: impl Iterator<Item = bool>) {
    let tables = flags
        .map(|flag| PresentationPropertiesModel::create(builder, flag).unwrap())
        .collect::<Vec<_>>();
    let children = builder.create_vector_of_offsets(&tables).unwrap();
    builder.start_table(sample::NUM_FIELDS).unwrap();
    builder.add_offset(sample::CHILDREN, children).unwrap();
    let root_table = builder.end_table::<()>().unwrap();
    builder.finish(root_table).unwrap();
}

#[test]
fn test_vtable_shared_by_identical_tables() {
    const N: usize = 16;
    let mut builder = Builder::new();
    build_children(&mut builder, std::iter::repeat_n(true, N));
    // The children's vtable and the root's.
    assert_eq!(builder.num_vtables(), 2);
    assert_eq!(child_vtable_positions(builder.finished_data().unwrap()).len(), 1);

    let mut builder = Builder::new();
    build_children(&mut builder, (0..N).map(|i| i % 3 != 2));
    assert_eq!(builder.num_vtables(), 3);
    assert_eq!(child_vtable_positions(builder.finished_data().unwrap()).len(), 2);

    let mut builder = Builder::with_options(BuilderOptions::default().dedup_vtables(false));
    build_children(&mut builder, std::iter::repeat_n(true, N));
    assert_eq!(child_vtable_positions(builder.finished_data().unwrap()).len(), N);
}

#[test]
fn test_vector_indexing() {
    let mut builder = Builder::new();
    let values = builder.create_vector::<u16>(&[10, 20, 30]).unwrap();
    builder.start_table(1).unwrap();
    builder.add_offset(0, values).unwrap();
    let table = builder.end_table::<()>().unwrap();
    builder.finish(table).unwrap();

    let table = root::<Table>(builder.finished_data().unwrap()).unwrap();
    let values: Vector<u16> = table.get_vector(0).unwrap().unwrap();
    assert_eq!(values.len(), 3);
    for i in 0..values.len() {
        assert_eq!(values.get(i).unwrap(), values.get(i).unwrap());
    }
    for index in [3, 4, 1000] {
        assert!(matches!(
            values.get(index).unwrap_err().kind(),
            ErrorKind::IndexOutOfRange { len: 3, .. }
        ));
    }
    // Iteration restarts from the beginning each time.
    assert_eq!(values.iter().count(), 3);
    assert_eq!(values.iter().count(), 3);
}

#[test]
fn test_little_endian_on_the_wire() {
    let mut builder = Builder::new();
    let values = builder.create_vector::<u32>(&[0x0102_0304]).unwrap();
    builder.start_table(2).unwrap();
    builder.add_field::<i64>(0, 0x0102_0304_0506_0708, 0).unwrap();
    builder.add_offset(1, values).unwrap();
    let table = builder.end_table::<()>().unwrap();
    builder.finish(table).unwrap();
    let data = builder.finished_data().unwrap();

    let table = root::<Table>(data).unwrap();
    let loc = table.field_location(0).unwrap().unwrap();
    assert_eq!(&data[loc..loc + 8], &[8, 7, 6, 5, 4, 3, 2, 1]);
    let vector = table.reference(1).unwrap().unwrap();
    assert_eq!(&data[vector..vector + 8], &[1, 0, 0, 0, 4, 3, 2, 1]);
}

#[test]
fn test_two_integer_fields_second_written() {
    let mut builder = Builder::new();
    builder.start_table(2).unwrap();
    builder.add_field::<i32>(1, 42, 0).unwrap();
    let table = builder.end_table::<()>().unwrap();
    builder.finish(table).unwrap();

    let table = root::<Table>(builder.finished_data().unwrap()).unwrap();
    assert_eq!(table.get::<i32>(0, 0).unwrap(), 0);
    assert_eq!(table.get::<i32>(1, 0).unwrap(), 42);
    // Header plus both slots: the absent first slot precedes a present one.
    assert_eq!(table.vtable().unwrap().byte_size(), 4 * 2);
}

#[test]
fn test_two_integer_fields_first_written() {
    let mut builder = Builder::new();
    builder.start_table(2).unwrap();
    builder.add_field::<i32>(0, 42, 0).unwrap();
    let table = builder.end_table::<()>().unwrap();
    builder.finish(table).unwrap();

    let table = root::<Table>(builder.finished_data().unwrap()).unwrap();
    assert_eq!(table.get::<i32>(0, 0).unwrap(), 42);
    assert_eq!(table.get::<i32>(1, 0).unwrap(), 0);
    // Trailing absent slots are trimmed: header plus one slot.
    assert_eq!(table.vtable().unwrap().byte_size(), 3 * 2);
}

#[test]
fn test_string_layout() {
    let mut builder = Builder::new();
    let text = builder.create_string("abc").unwrap();
    builder.start_table(1).unwrap();
    builder.add_offset(0, text).unwrap();
    let table = builder.end_table::<()>().unwrap();
    builder.finish(table).unwrap();
    let data = builder.finished_data().unwrap();

    let table = root::<Table>(data).unwrap();
    let bytes: Vector<u8> = table.get_vector(0).unwrap().unwrap();
    assert_eq!(bytes.len(), 3);
    assert_eq!(bytes.as_bytes(), &[0x61, 0x62, 0x63]);
    let end = bytes.position() + 4 + bytes.len();
    assert_eq!(data[end], 0);
    assert_eq!(table.get_str(0).unwrap(), Some("abc"));
}

#[test]
fn test_seeded_random_tables() {
    for seed in 0..32 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let num_fields = rng.usize(1..24);
        let fields = (0..num_fields)
            .map(|_| rng.bool().then(|| rng.i64(..)))
            .collect::<Vec<_>>();
        let strings = (0..rng.usize(0..8))
            .map(|_| {
                let len = rng.usize(0..20);
                (0..len).map(|_| rng.alphanumeric()).collect::<String>()
            })
            .collect::<Vec<_>>();

        let mut builder = Builder::with_options(BuilderOptions::default().initial_capacity(16));
        let string_refs = strings.iter().map(String::as_str).collect::<Vec<_>>();
        let vector = builder.create_vector_of_strings(&string_refs).unwrap();
        builder.start_table(num_fields + 1).unwrap();
        for (slot, value) in fields.iter().enumerate() {
            if let Some(value) = value {
                builder.add_field::<i64>(slot, *value, -1).unwrap();
            }
        }
        builder.add_offset(num_fields, vector).unwrap();
        let table = builder.end_table::<()>().unwrap();
        builder.finish(table).unwrap();
        let data = builder.finished_data().unwrap();
        verify_root::<Table>(data, &VerifierOptions::default()).unwrap();

        let table = root::<Table>(data).unwrap();
        for (slot, value) in fields.iter().enumerate() {
            assert_eq!(
                table.get::<i64>(slot, -1).unwrap(),
                value.unwrap_or(-1),
                "seed {seed}, slot {slot}"
            );
        }
        let read: Vector<StrItem> = table.get_vector(num_fields).unwrap().unwrap();
        assert_eq!(read.to_vec().unwrap(), string_refs, "seed {seed}");
    }
}

#[test]
fn test_mutate_present_field() {
    let mut builder = Builder::with_options(BuilderOptions::default().force_defaults(true));
    let table = PresentationPropertiesModel::create(&mut builder, false).unwrap();
    builder.finish(table).unwrap();
    let mut data = builder.finished_data().unwrap().to_vec();

    let mut model = PresentationPropertiesModelMut::from_root(&mut data).unwrap();
    assert!(model.set_is_in_memory(true).unwrap());
    assert!(model.as_reader().is_in_memory().unwrap());

    let mut builder = Builder::new();
    let table = PresentationPropertiesModel::create(&mut builder, false).unwrap();
    builder.finish(table).unwrap();
    let mut data = builder.finished_data().unwrap().to_vec();
    let original = data.clone();
    let mut model = PresentationPropertiesModelMut::from_root(&mut data).unwrap();
    assert!(!model.set_is_in_memory(true).unwrap());
    assert_eq!(data, original);
}

#[test]
fn test_concurrent_readers() {
    let mut builder = Builder::new();
    let table = build_sample(&mut builder);
    builder.finish(table).unwrap();
    let data = builder.into_bytes().unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let table = root::<Table>(&data).unwrap();
                let tags: Vector<StrItem> = table.get_vector(sample::TAGS).unwrap().unwrap();
                assert_eq!(tags.to_vec().unwrap(), vec!["a", "bc", ""]);
                assert_eq!(table.get::<i16>(sample::I16, 0).unwrap(), -300);
            });
        }
    });
}

#[test]
fn test_options_from_json() {
    let options: BuilderOptions = serde_json::from_str(r#"{"force_defaults": true}"#).unwrap();
    assert!(options.force_defaults);
    assert!(options.dedup_vtables);

    let options: VerifierOptions =
        serde_json::from_str(r#"{"max_depth": 2, "check_alignment": false}"#).unwrap();
    assert_eq!(options.max_depth, 2);
    assert!(!options.check_alignment);
    assert_eq!(options.max_tables, VerifierOptions::default().max_tables);
}

#[test]
fn test_generic_root_is_checked_by_verifier() {
    let mut builder = Builder::new();
    let table = build_sample(&mut builder);
    builder.finish(table).unwrap();
    let mut data = builder.finished_data().unwrap().to_vec();

    // Point the root at the middle of the name string.
    let name = root::<Table>(&data)
        .unwrap()
        .reference(sample::NAME)
        .unwrap()
        .unwrap();
    data[0..4].copy_from_slice(&((name + 4) as u32).to_le_bytes());
    assert!(verify_root::<Sample>(&data, &VerifierOptions::default()).is_err());
    let options = VerifierOptions::default();
    let mut verifier = Verifier::new(&data, &options);
    assert!(verifier.verify_root::<Table>().is_err());
}
