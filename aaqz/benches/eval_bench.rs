use aaqz::{Evaluator, Expr, StringIoAdapter, parser};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn parse_one(source: &str) -> Expr {
  parser::parse(source)
    .expect("benchmark program should parse")
    .expect("benchmark program should not be empty")
    .0
}

fn bench_factorial(c: &mut Criterion) {
  let mut group = c.benchmark_group("factorial_self_application");

  for n in [5, 10, 15, 20].iter() {
    let program = parse_one(&format!(
      "{{((fact) => (fact fact {}))
         ((self n) => (if (<= n 0) 1 (* n (self self (- n 1)))))}}",
      n
    ));

    group.bench_with_input(BenchmarkId::from_parameter(n), &program, |b, program| {
      b.iter(|| {
        let mut io = StringIoAdapter::output_only();
        let mut evaluator = Evaluator::new(&mut io);
        black_box(evaluator.eval(black_box(program)).ok())
      })
    });
  }

  group.finish();
}

fn bench_fibonacci(c: &mut Criterion) {
  let mut group = c.benchmark_group("fibonacci_self_application");

  for n in [10, 15, 20].iter() {
    let program = parse_one(&format!(
      "{{((fib) => (fib fib {}))
         ((self n) => (if (<= n 1) n (+ (self self (- n 1)) (self self (- n 2)))))}}",
      n
    ));

    group.bench_with_input(BenchmarkId::from_parameter(n), &program, |b, program| {
      b.iter(|| {
        let mut io = StringIoAdapter::output_only();
        let mut evaluator = Evaluator::new(&mut io);
        black_box(evaluator.eval(black_box(program)).ok())
      })
    });
  }

  group.finish();
}

fn bench_closures(c: &mut Criterion) {
  let currying = parse_one("{((add) => (((add 1) 2) 3)) ((x) => ((y) => ((z) => (+ (+ x y) z))))}");
  c.bench_function("closure_currying", |b| {
    b.iter(|| {
      let mut io = StringIoAdapter::output_only();
      let mut evaluator = Evaluator::new(&mut io);
      black_box(evaluator.eval(black_box(&currying)).ok())
    })
  });

  let concat = parse_one("(++ \"n = \" 42 \", ok = \" true \", name = \" \"aaqz\")");
  c.bench_function("primitive_concat", |b| {
    b.iter(|| {
      let mut io = StringIoAdapter::output_only();
      let mut evaluator = Evaluator::new(&mut io);
      black_box(evaluator.eval(black_box(&concat)).ok())
    })
  });
}

criterion_group!(benches, bench_factorial, bench_fibonacci, bench_closures);

criterion_main!(benches);
