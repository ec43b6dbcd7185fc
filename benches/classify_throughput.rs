use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use customer_cleaner::address::parse_address;
use customer_cleaner::classify::classify;
use customer_cleaner::district::DistrictIndex;
use customer_cleaner::mapping::{CanonicalField, FieldMapping};
use customer_cleaner::record::Record;
use customer_cleaner::settings::Settings;

const DISTRICTS: [&str; 4] = ["Jardim Primavera", "Centro", "Vila Nova", "Jardim Europa"];
const CITIES: [&str; 3] = ["Sorocaba", "Itu", "Votorantim"];

fn generate_customers(rows: usize) -> Vec<Record> {
    (0..rows)
        .map(|i| {
            let district = DISTRICTS[i % DISTRICTS.len()];
            let city = CITIES[i % CITIES.len()];
            let address = if i % 5 == 0 {
                format!("Rua {i} {}, {district}, {city} - SP;Avenida Brasil {i}", i % 900 + 1)
            } else {
                format!(
                    "Rua das Flores, {}, {district}, {city} - SP, 18{:06}",
                    i % 900 + 1,
                    i % 1_000_000
                )
            };
            let phone = match i % 4 {
                0 => format!("55119{:08}", i % 100_000_000),
                1 => format!("({:02}) 9{:04}-{:04}", 11 + i % 80, i % 10_000, (i * 7) % 10_000),
                2 => format!("{:08}", i % 100_000_000),
                _ => "123".to_string(),
            };
            [
                ("Nome", format!("Cliente {i}")),
                ("Telefone", phone),
                ("Endereço", address),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

fn district_index() -> DistrictIndex {
    let reference: Vec<Record> = CITIES
        .iter()
        .flat_map(|city| {
            DISTRICTS.iter().map(move |district| {
                [("Cidade", *city), ("Bairro", *district), ("Estado", "SP")]
                    .into_iter()
                    .collect()
            })
        })
        .collect();
    DistrictIndex::build(&reference)
}

fn bench_classify(c: &mut Criterion) {
    let customers = generate_customers(20_000);
    let mapping = FieldMapping::from_pairs([
        ("Nome", CanonicalField::FullName),
        ("Telefone", CanonicalField::Phone),
        ("Endereço", CanonicalField::EnderecoCompleto),
    ])
    .expect("mapping");
    let settings = Settings {
        default_ddd: Some("15".into()),
        discard_rows_without_address: true,
        ..Settings::default()
    };
    let districts = district_index();
    let no_districts = DistrictIndex::default();

    let mut group = c.benchmark_group("classify");

    group.bench_function("parse_address", |b| {
        b.iter(|| {
            for row in &customers {
                black_box(parse_address(row.value("Endereço")));
            }
        });
    });

    group.bench_function("without_districts", |b| {
        b.iter_batched(
            || (),
            |_| black_box(classify(&customers, &mapping, &settings, &no_districts)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("with_districts", |b| {
        b.iter_batched(
            || (),
            |_| black_box(classify(&customers, &mapping, &settings, &districts)),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
