//! Benchmarks the dispatch loop on a recursive workload, where CALL/RET
//! frame setup dominates over any single arithmetic opcode.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cvm_vm::{VirtualMachine, DEFAULT_MEM_WORDS};

fn compile(source: &str) -> cvm_gen::ExecutableImage {
    let tokens = cvm_lex::Lexer::new(source).tokenize().expect("lexes");
    let parsed = cvm_par::parse(source, tokens).expect("parses");
    cvm_gen::generate(&parsed).expect("generates")
}

fn bench_fibonacci(c: &mut Criterion) {
    let image = compile(
        "int fib(int n) { if (n <= 1) return n; return fib(n - 1) + fib(n - 2); } \
         int main() { return fib(20); }",
    );

    c.bench_function("vm_dispatch_fib_20", |b| {
        b.iter(|| {
            let mut vm = VirtualMachine::new(DEFAULT_MEM_WORDS);
            vm.load(&image).expect("fits");
            let mut sink = Vec::new();
            vm.run(&mut sink).expect("runs");
            black_box(vm.call_stats());
        });
    });
}

criterion_group!(benches, bench_fibonacci);
criterion_main!(benches);
