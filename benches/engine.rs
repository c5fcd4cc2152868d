use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use plastic_market::{Amount, InMemoryLedger, Marketplace, ParticipantId, Weight};

const MARKET: ParticipantId = ParticipantId::MAX;
const COMPANY_BASE: ParticipantId = 1;
const PICKER_BASE: ParticipantId = 1_000_000;

/// Marketplace with `companies` companies (min weight 10, price 3) and
/// `pickers` pickers, plus a ledger where every company can pay without limit.
fn setup(companies: u64, pickers: u64) -> (Marketplace, InMemoryLedger) {
    let mut market = Marketplace::new(0, MARKET);
    let mut ledger = InMemoryLedger::new();

    for c in 0..companies {
        let id = COMPANY_BASE + c;
        market
            .register_company(id, format!("company-{c}"), 10, 3, true)
            .unwrap();
        ledger.mint(id, Amount::new(u128::MAX / 2));
        ledger.approve(id, MARKET, Amount::new(u128::MAX / 2));
    }
    for p in 0..pickers {
        market
            .register_picker(PICKER_BASE + p, format!("picker-{p}"), "p@example.org".into())
            .unwrap();
    }
    (market, ledger)
}

/// Deposits spread round-robin over pickers and companies.
fn deposits(market: &mut Marketplace, count: u64, companies: u64, pickers: u64) {
    for i in 0..count {
        let weight: Weight = 10 + i % 50;
        let _ = black_box(market.deposit(
            PICKER_BASE + i % pickers,
            COMPANY_BASE + i % companies,
            weight,
        ));
    }
}

fn bench_deposit_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("deposits");

    for count in [1_000u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let (mut market, _) = setup(10, 100);
                deposits(&mut market, count, 10, 100);
                market
            });
        });
    }

    group.finish();
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("lifecycle");
    group.sample_size(10);

    for count in [100u64, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let (mut market, mut ledger) = setup(10, 100);
                deposits(&mut market, count, 10, 100);
                for tx in 0..count {
                    let company = COMPANY_BASE + tx % 10;
                    let _ = black_box(market.validate(company, tx));
                    let _ = black_box(market.settle(company, tx, &mut ledger));
                }
                market
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_deposit_only, bench_full_lifecycle);
criterion_main!(benches);
