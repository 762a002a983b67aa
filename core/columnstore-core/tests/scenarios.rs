//! End-to-end scenarios from spec.md §8, driven through the public
//! dispatcher against an in-process engine (no socket involved — the wire
//! protocol is the server crate's concern).

use columnstore_core::parser::parse_line;
use columnstore_core::{dispatch, Batch, ClientContext, Engine, EngineConfig, ResultValue};

fn run(engine: &mut Engine, context: &ClientContext, batch: &mut Batch, line: &str) {
    let cmd = parse_line(line).unwrap().unwrap();
    dispatch(cmd, engine, context, batch).unwrap();
}

fn ints(context: &ClientContext, handle: &str) -> Vec<i32> {
    match context.get(handle).unwrap() {
        ResultValue::Int(v) => v,
        other => panic!("expected INT result, got {other:?}"),
    }
}

#[test]
fn s1_unclustered_select_fetch_sum_avg() {
    let mut engine = Engine::new(EngineConfig::default());
    let context = ClientContext::new(8);
    let mut batch = Batch::default();

    engine.create_database("db1");
    engine
        .create_table("t1", &["a".to_string(), "b".to_string()])
        .unwrap();

    for (a, b) in [(1, 10), (3, 30), (2, 20), (5, 50), (4, 40)] {
        run(&mut engine, &context, &mut batch, &format!("relational_insert(db1.t1,{a},{b})"));
    }

    run(&mut engine, &context, &mut batch, "h1=select(db1.t1.a,2,5)");
    assert_eq!(ints(&context, "h1"), vec![2, 1, 3]);

    run(&mut engine, &context, &mut batch, "h2=fetch(db1.t1.a,h1)");
    let mut fetched = ints(&context, "h2");
    fetched.sort_unstable();
    assert_eq!(fetched, vec![2, 3, 4]);

    run(&mut engine, &context, &mut batch, "h3=sum(h2)");
    assert_eq!(context.get("h3").unwrap(), ResultValue::Long(vec![9]));

    run(&mut engine, &context, &mut batch, "h4=avg(h2)");
    match context.get("h4").unwrap() {
        ResultValue::Double(v) => assert!((v[0] - 3.0).abs() < 1e-9),
        other => panic!("expected DOUBLE, got {other:?}"),
    }
}

#[test]
fn s2_clustered_sorted_index_reorders_every_column() {
    let mut engine = Engine::new(EngineConfig::default());
    let context = ClientContext::new(8);
    let mut batch = Batch::default();

    engine.create_database("db1");
    engine
        .create_table("t1", &["a".to_string(), "b".to_string()])
        .unwrap();
    engine
        .resolve_table_mut("db1.t1")
        .unwrap()
        .set_clustering_column(0, 1024, false);

    for (a, b) in [(1, 10), (3, 30), (2, 20), (5, 50), (4, 40)] {
        run(&mut engine, &context, &mut batch, &format!("relational_insert(db1.t1,{a},{b})"));
    }

    {
        let db = engine.current_db().unwrap();
        let table = db.table("t1").unwrap();
        assert_eq!(table.columns[0].data, vec![1, 2, 3, 4, 5]);
        assert_eq!(table.columns[1].data, vec![10, 20, 30, 40, 50]);
    }

    run(&mut engine, &context, &mut batch, "h1=select(db1.t1.a,2,5)");
    assert_eq!(ints(&context, "h1"), vec![1, 2, 3]);
    run(&mut engine, &context, &mut batch, "h2=fetch(db1.t1.b,h1)");
    assert_eq!(ints(&context, "h2"), vec![20, 30, 40]);
}

#[test]
fn s3_unclustered_btree_matches_brute_force_counts() {
    use std::collections::BTreeMap;

    let config = EngineConfig::builder().max_node_keys(32).build();
    let mut engine = Engine::new(config);
    engine.create_database("db1");
    engine.create_table("t1", &["b".to_string()]).unwrap();
    engine
        .resolve_table_mut("db1.t1")
        .unwrap()
        .create_secondary_index(0, 32, true);

    let mut rng_state: u64 = 0x2545F4914F6CDD1D;
    let mut next = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        (rng_state % 100_000) as i32 - 50_000
    };

    let mut oracle: BTreeMap<i32, usize> = BTreeMap::new();
    for _ in 0..2000 {
        let v = next();
        engine.resolve_table_mut("t1").unwrap().insert_row(&[v]).unwrap();
        *oracle.entry(v).or_default() += 1;
    }

    for trial in 0..50 {
        let lo = (trial * 1000) - 25_000;
        let hi = lo + 2000;
        let context = ClientContext::new(8);
        let mut batch = Batch::default();
        run(
            &mut engine,
            &context,
            &mut batch,
            &format!("h1=select(db1.t1.b,{lo},{hi})"),
        );
        let got = ints(&context, "h1").len();
        let want: usize = oracle.range(lo..hi).map(|(_, c)| *c).sum();
        assert_eq!(got, want, "mismatch for range [{lo}, {hi})");
    }
}

#[test]
fn s4_batched_selects_union_to_full_range_with_disjoint_handles() {
    let mut engine = Engine::new(EngineConfig::default());
    let context = ClientContext::new(8);
    let mut batch = Batch::default();

    engine.create_database("db1");
    engine
        .create_table("t1", &["a".to_string()])
        .unwrap();
    engine
        .resolve_table_mut("db1.t1")
        .unwrap()
        .set_clustering_column(0, 1024, false);
    for v in 0..30 {
        engine.resolve_table_mut("t1").unwrap().insert_row(&[v]).unwrap();
    }

    run(&mut engine, &context, &mut batch, "batch_queries()");
    run(&mut engine, &context, &mut batch, "h1=select(db1.t1.a,0,10)");
    run(&mut engine, &context, &mut batch, "h2=select(db1.t1.a,10,20)");
    run(&mut engine, &context, &mut batch, "h3=select(db1.t1.a,20,30)");
    run(&mut engine, &context, &mut batch, "batch_execute()");

    let h1 = ints(&context, "h1");
    let h2 = ints(&context, "h2");
    let h3 = ints(&context, "h3");

    let mut seen = std::collections::HashSet::new();
    for h in [&h1, &h2, &h3] {
        for &p in h {
            assert!(seen.insert(p), "handle position {p} duplicated across batch results");
        }
    }

    let mut union: Vec<i32> = h1.into_iter().chain(h2).chain(h3).collect();
    union.sort_unstable();
    assert_eq!(union, (0..30).collect::<Vec<_>>());

    let mut batch2 = Batch::default();
    run(&mut engine, &context, &mut batch2, "h_all=select(db1.t1.a,0,30)");
    assert_eq!(ints(&context, "h_all"), union);
}

#[test]
fn s5_hash_join() {
    let mut engine = Engine::new(EngineConfig::default());
    engine.create_database("db1");
    let context = ClientContext::new(8);
    context.put("vals1", ResultValue::Int(vec![7, 3, 5, 3]));
    context.put("pos1", ResultValue::Int(vec![0, 1, 2, 3]));
    context.put("vals2", ResultValue::Int(vec![3, 8, 5]));
    context.put("pos2", ResultValue::Int(vec![0, 1, 2]));

    let mut batch = Batch::default();
    run(&mut engine, &context, &mut batch, "h1,h2=join(vals1,pos1,vals2,pos2,hash)");
    assert_eq!(ints(&context, "h1"), vec![1, 2, 3]);
    assert_eq!(ints(&context, "h2"), vec![0, 0, 2]);
}

#[test]
fn s6_print_builds_tiled_frames_for_round_trip() {
    use columnstore_core::ops::print::{build_print, PrintFrames};

    let mut engine = Engine::new(EngineConfig::default());
    let context = ClientContext::new(8);
    let mut batch = Batch::default();

    engine.create_database("db1");
    engine
        .create_table("t1", &["a".to_string(), "b".to_string()])
        .unwrap();
    for (a, b) in (0..20).map(|i| (i, i * 10)) {
        run(&mut engine, &context, &mut batch, &format!("relational_insert(db1.t1,{a},{b})"));
    }

    let a = ResultValue::Int(engine.current_db().unwrap().table("t1").unwrap().columns[0].data.clone());
    let b = ResultValue::Int(engine.current_db().unwrap().table("t1").unwrap().columns[1].data.clone());
    let frames = build_print(&[a.clone(), b.clone()], 8).unwrap();

    match frames {
        PrintFrames::MultiRow { num_columns, tiles, .. } => {
            assert_eq!(num_columns, 2);
            let mut recovered_a = Vec::new();
            let mut recovered_b = Vec::new();
            for tile in &tiles {
                let rows = tile.len() / num_columns;
                recovered_a.extend_from_slice(&tile[0..rows]);
                recovered_b.extend_from_slice(&tile[rows..rows * 2]);
            }
            assert_eq!(ResultValue::Int(recovered_a), a);
            assert_eq!(ResultValue::Int(recovered_b), b);
        }
        _ => panic!("expected multi-row frames for a 20-row print"),
    }
}

#[test]
fn s7_persistence_round_trip_preserves_query_results() {
    use columnstore_core::persistence::{persist, restore};
    use tempfile::tempdir;

    let config = EngineConfig::builder().max_node_keys(8).build();
    let mut engine = Engine::new(config.clone());
    engine.create_database("db1");
    engine
        .create_table("t1", &["a".to_string(), "b".to_string()])
        .unwrap();
    engine
        .resolve_table_mut("db1.t1")
        .unwrap()
        .set_clustering_column(0, 8, true);

    let context = ClientContext::new(8);
    let mut batch = Batch::default();
    for (a, b) in [(1, 10), (3, 30), (2, 20), (5, 50), (4, 40)] {
        run(&mut engine, &context, &mut batch, &format!("relational_insert(db1.t1,{a},{b})"));
    }

    let dir = tempdir().unwrap();
    persist(&engine, dir.path()).unwrap();
    let mut restored = restore(config, dir.path()).unwrap();

    let context2 = ClientContext::new(8);
    let mut batch2 = Batch::default();
    run(&mut restored, &context2, &mut batch2, "h1=select(db1.t1.a,2,5)");
    assert_eq!(ints(&context2, "h1"), vec![1, 2, 3]);
    run(&mut restored, &context2, &mut batch2, "h2=fetch(db1.t1.b,h1)");
    assert_eq!(ints(&context2, "h2"), vec![20, 30, 40]);
    run(&mut restored, &context2, &mut batch2, "h3=sum(h2)");
    assert_eq!(context2.get("h3").unwrap(), ResultValue::Long(vec![90]));
}
