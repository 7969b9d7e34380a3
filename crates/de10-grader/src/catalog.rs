//! The exercise catalog.
//!
//! An explicit registry built at startup and handed to the grading
//! entry point. Each exercise carries its checker plus the prose and
//! starter assembly shown to learners.

use format_objimg::ObjectImage;

use crate::checks::{
    Verdict, check_adder, check_array_sum, check_fib, check_find_min, check_led_on,
    check_list_sum, check_sort,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// One gradable exercise.
pub struct Exercise {
    pub id: &'static str,
    pub title: &'static str,
    pub difficulty: Difficulty,
    pub description: &'static str,
    pub starter: &'static str,
    pub checker: fn(&ObjectImage) -> Verdict,
}

/// Build the full exercise registry.
#[must_use]
pub fn catalog() -> Vec<Exercise> {
    vec![
        Exercise {
            id: "find-min",
            title: "Find the minimum value in an array",
            difficulty: Difficulty::Easy,
            description: "You are given an array of words starting at ARR that contains \
                          N words in it. Find the lowest signed value in the array, \
                          write it to the word MIN, then call the break instruction.",
            starter: "\
.text
_start:

.data
# Make sure ARR is the last label in .data
MIN: .word 0
N:   .word 5
ARR: .word 5, -8, -1, 12, 6
",
            checker: check_find_min,
        },
        Exercise {
            id: "sum-array",
            title: "Array Sum",
            difficulty: Difficulty::Easy,
            description: "You are given an array of signed words starting at ARR for \
                          length N words. Find the sum of all the positive integers, \
                          write it to the word SUM, then call the break instruction.",
            starter: "\
.text
_start:

.data
# Make sure ARR is the last label in .data
SUM: .word 0
N:   .word 6
ARR: .word 14, 22, 0, -9, -12, 27
",
            checker: check_array_sum,
        },
        Exercise {
            id: "led-on",
            title: "Set LEDs on",
            difficulty: Difficulty::Easy,
            description: "Turn on all 10 LEDs on the DE10-Lite, then call the break \
                          instruction. Hint: the LED MMIO address is 0xFF200000.",
            starter: "\
.text
_start:
",
            checker: check_led_on,
        },
        Exercise {
            id: "proj1",
            title: "Project 1",
            difficulty: Difficulty::Medium,
            description: "Read the ten switches as two 5-bit operands and drive the \
                          LEDs with their sum, continuously.",
            starter: "\
.text
_start:
    movia   r4, 0xFF200000
    movia   r5, 0xFF200040

loop:
    ldwio   r6, 0(r5)


    stwio   r6, 0(r4)
    br      loop
",
            checker: check_adder,
        },
        Exercise {
            id: "list-sum",
            title: "Sum a Linked List",
            difficulty: Difficulty::Medium,
            description: "You are given a linked list node at addr HEAD. Each node is a \
                          word next pointing at the following node, then a word value; \
                          the last node's next is 0 (NULL). Sum all the values, write \
                          the sum to SUM, then call the break instruction.",
            starter: "\
.text
_start:


.data
SUM:    .word 0
HEAD:   .word N1, 5
N1:     .word N2, 3
N2:     .word N3, 10
N3:     .word 0,  6
",
            checker: check_list_sum,
        },
        Exercise {
            id: "fibonacci",
            title: "Fibonacci Sequence",
            difficulty: Difficulty::Medium,
            description: "Write a function fib that takes n in r4 and returns f(n) in \
                          r2, where f(0) = 0, f(1) = 1, and f(n) = f(n-1) + f(n-2).",
            starter: "\
.text
fib:
    # Write your code here

    ret

_start:
    # You should probably test your program!
    # Feel free to change the value of N, but leave the rest of
    # this code as is.
    movia   sp, 0x04000000  # Setup the stack pointer
    subi    sp, sp, 4

    movia   r4, N
    ldw     r4, 0(r4)

    call    fib             # fib(N)

    movia   r4, F
    stw     r2, 0(r4)       # store r2 to F
    break                   # r2 should be 55 here.
.data
N:  .word 10
F:  .word 0
",
            checker: check_fib,
        },
        Exercise {
            id: "sort",
            title: "Sort an array",
            difficulty: Difficulty::Hard,
            description: "You are given an array of signed words starting at SORT that \
                          contains N words. Sort it in place, ascending, then call the \
                          break instruction. A simple in-place sort such as bubble \
                          sort is fine.",
            starter: "\
.text
_start:


.data
N: .word 5
SORT: .word 8, 3, 7, 2, 9
# Padding
.rept 100 .word 0
.endr
",
            checker: check_sort,
        },
    ]
}
