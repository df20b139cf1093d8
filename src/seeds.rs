//! Built-in question generators.
//!
//! A minimal set of content that guarantees the engine is useful even without
//! an external bank or TOML config: at least one generator per topic for each
//! difficulty tier 1..=3. Coefficients are drawn from the caller's RNG.

use rand::{Rng, RngCore};

use crate::bank::Candidate;
use crate::domain::{fresh_id, AnswerValue, Question, Solution, Topic};
use crate::util::round_to;

struct Draft {
  topic: Topic,
  difficulty: u32,
  description: String,
  equation: String,
  steps: Vec<String>,
  answers: Vec<(&'static str, AnswerValue)>,
  hints: Vec<String>,
}

impl Draft {
  fn build(self, rng: &mut dyn RngCore) -> Question {
    Question {
      id: fresh_id(rng),
      topic: self.topic,
      difficulty: self.difficulty,
      description: self.description,
      equation_text: self.equation,
      solution: Solution {
        steps: self.steps,
        final_answers: self.answers.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
      },
      hints: self.hints,
    }
  }
}

/// "+ 3" / "- 3" for appending a signed term.
fn signed(n: i64) -> String {
  if n < 0 { format!("- {}", -n) } else { format!("+ {}", n) }
}

/// Stored the way hand-written content often is: as a 3-decimal string.
fn dec3(v: f64) -> AnswerValue {
  AnswerValue::Text(format!("{:.3}", round_to(v, 3)))
}

fn num(v: f64) -> AnswerValue {
  AnswerValue::Number(v)
}

fn pick<T: Copy>(rng: &mut dyn RngCore, items: &[T]) -> T {
  items[rng.gen_range(0..items.len())]
}

pub fn builtin_candidates() -> Vec<(Topic, Candidate)> {
  vec![
    (Topic::Equations, Candidate::new(1, linear_equation)),
    (Topic::Equations, Candidate::new(2, linear_system)),
    (Topic::Equations, Candidate::new(3, quadratic_roots)),
    (Topic::Trigonometry, Candidate::new(1, special_angle)),
    (Topic::Trigonometry, Candidate::new(2, right_triangle_side)),
    (Topic::Trigonometry, Candidate::new(3, inverse_sine)),
    (Topic::Vectors, Candidate::new(1, vector_sum)),
    (Topic::Vectors, Candidate::new(2, dot_product)),
    (Topic::Vectors, Candidate::new(3, vector_magnitude)),
    (Topic::Complex, Candidate::new(1, complex_sum)),
    (Topic::Complex, Candidate::new(2, complex_product)),
    (Topic::Complex, Candidate::new(3, complex_modulus)),
    (Topic::Calculus, Candidate::new(1, quadratic_derivative)),
    (Topic::Calculus, Candidate::new(2, linear_integral)),
    (Topic::Calculus, Candidate::new(3, cubic_derivative)),
    (Topic::Sequences, Candidate::new(1, arithmetic_term)),
    (Topic::Sequences, Candidate::new(2, geometric_term)),
    (Topic::Sequences, Candidate::new(3, arithmetic_sum)),
    (Topic::Geometry, Candidate::new(1, rectangle_perimeter)),
    (Topic::Geometry, Candidate::new(2, rectangle_diagonal)),
    (Topic::Geometry, Candidate::new(3, circle_area)),
    (Topic::Probability, Candidate::new(1, die_at_least)),
    (Topic::Probability, Candidate::new(2, two_dice_sum)),
    (Topic::Probability, Candidate::new(3, draw_two_red)),
  ]
}

// -------- equations --------

fn linear_equation(rng: &mut dyn RngCore) -> Question {
  let a: i64 = rng.gen_range(2..=9);
  let x: i64 = rng.gen_range(-9..=9);
  let b: i64 = rng.gen_range(-10..=10);
  let c = a * x + b;
  Draft {
    topic: Topic::Equations,
    difficulty: 1,
    description: "Solve the linear equation for x.".into(),
    equation: format!("{}x {} = {}", a, signed(b), c),
    steps: vec![format!("{}x = {}", a, c - b), format!("x = {}", x)],
    answers: vec![("x", AnswerValue::Text(x.to_string()))],
    hints: vec![
      "Move the constant term to the right-hand side.".into(),
      format!("Divide both sides by {}.", a),
    ],
  }
  .build(rng)
}

fn linear_system(rng: &mut dyn RngCore) -> Question {
  let x: i64 = rng.gen_range(-5..=5);
  let y: i64 = rng.gen_range(-5..=5);
  let (a1, b1, a2, b2) = loop {
    let c: (i64, i64, i64, i64) =
      (rng.gen_range(1..=5), rng.gen_range(1..=5), rng.gen_range(1..=5), rng.gen_range(-5..=-1));
    if c.0 * c.3 - c.1 * c.2 != 0 {
      break c;
    }
  };
  let (c1, c2) = (a1 * x + b1 * y, a2 * x + b2 * y);
  Draft {
    topic: Topic::Equations,
    difficulty: 2,
    description: "Solve the system of equations for x and y.".into(),
    equation: format!("{}x {}y = {}\n{}x {}y = {}", a1, signed(b1), c1, a2, signed(b2), c2),
    steps: vec![
      "Eliminate one variable by combining the equations.".into(),
      format!("x = {}", x),
      format!("y = {}", y),
    ],
    answers: vec![("x", num(x as f64)), ("y", num(y as f64))],
    hints: vec![
      "Multiply one equation so a coefficient matches the other.".into(),
      "Answer in the form x=..., y=...".into(),
    ],
  }
  .build(rng)
}

fn quadratic_roots(rng: &mut dyn RngCore) -> Question {
  let p: i64 = rng.gen_range(-6..=5);
  let q: i64 = rng.gen_range(p + 1..=6);
  Draft {
    topic: Topic::Equations,
    difficulty: 3,
    description: "Find both roots of the quadratic, smaller root first.".into(),
    equation: format!("x² {}x {} = 0", signed(-(p + q)), signed(p * q)),
    steps: vec![format!("(x {})(x {}) = 0", signed(-p), signed(-q))],
    answers: vec![("x1", num(p as f64)), ("x2", num(q as f64))],
    hints: vec![
      "Look for two numbers whose product is the constant term.".into(),
      "Answer as x1=..., x2=... with x1 < x2.".into(),
    ],
  }
  .build(rng)
}

// -------- trigonometry --------

fn special_angle(rng: &mut dyn RngCore) -> Question {
  let deg = pick(rng, &[0.0_f64, 30.0, 45.0, 60.0, 90.0]);
  let use_sin: bool = rng.gen();
  let (name, value) = if use_sin {
    ("sin", deg.to_radians().sin())
  } else {
    ("cos", deg.to_radians().cos())
  };
  Draft {
    topic: Topic::Trigonometry,
    difficulty: 1,
    description: "Evaluate to three decimal places.".into(),
    equation: format!("{}({}°)", name, deg),
    steps: vec![format!("{}({}°) ≈ {:.3}", name, deg, value)],
    answers: vec![("x", dec3(value))],
    hints: vec!["Recall the unit circle values for 30°, 45° and 60°.".into()],
  }
  .build(rng)
}

fn right_triangle_side(rng: &mut dyn RngCore) -> Question {
  let h: i64 = rng.gen_range(5..=20);
  let deg = pick(rng, &[30.0_f64, 45.0, 60.0]);
  let opposite = h as f64 * deg.to_radians().sin();
  Draft {
    topic: Topic::Trigonometry,
    difficulty: 2,
    description: format!(
      "A right triangle has hypotenuse {} and an angle of {}°. Find the side opposite that angle.",
      h, deg
    ),
    equation: format!("x = {} · sin({}°)", h, deg),
    steps: vec![format!("x ≈ {:.2}", opposite)],
    answers: vec![("x", num(round_to(opposite, 2)))],
    hints: vec!["Opposite = hypotenuse × sine of the angle.".into()],
  }
  .build(rng)
}

fn inverse_sine(rng: &mut dyn RngCore) -> Question {
  let deg = pick(rng, &[30.0_f64, 45.0, 60.0, 90.0]);
  let value = round_to(deg.to_radians().sin(), 3);
  Draft {
    topic: Topic::Trigonometry,
    difficulty: 3,
    description: "Find the acute angle x in degrees (0° < x ≤ 90°).".into(),
    equation: format!("sin(x) = {:.3}", value),
    steps: vec![format!("x = arcsin({:.3}) = {}°", value, deg)],
    answers: vec![("x", num(deg))],
    hints: vec![
      "Compare with the sine of 30°, 45°, 60° and 90°.".into(),
      "Give the angle in degrees.".into(),
    ],
  }
  .build(rng)
}

// -------- vectors --------

fn vector_sum(rng: &mut dyn RngCore) -> Question {
  let (a, b, c, d): (i64, i64, i64, i64) =
    (rng.gen_range(-9..=9), rng.gen_range(-9..=9), rng.gen_range(-9..=9), rng.gen_range(-9..=9));
  Draft {
    topic: Topic::Vectors,
    difficulty: 1,
    description: "Add the vectors u and v.".into(),
    equation: format!("u = ({}, {}), v = ({}, {})", a, b, c, d),
    steps: vec![format!("u + v = ({}, {})", a + c, b + d)],
    answers: vec![("x", num((a + c) as f64)), ("y", num((b + d) as f64))],
    hints: vec!["Add component by component.".into(), "Answer as x=..., y=...".into()],
  }
  .build(rng)
}

fn dot_product(rng: &mut dyn RngCore) -> Question {
  let (a, b, c, d): (i64, i64, i64, i64) =
    (rng.gen_range(-6..=6), rng.gen_range(-6..=6), rng.gen_range(-6..=6), rng.gen_range(-6..=6));
  Draft {
    topic: Topic::Vectors,
    difficulty: 2,
    description: "Compute the dot product u · v.".into(),
    equation: format!("u = ({}, {}), v = ({}, {})", a, b, c, d),
    steps: vec![format!("u · v = {}·{} + {}·{} = {}", a, c, b, d, a * c + b * d)],
    answers: vec![("dot", num((a * c + b * d) as f64))],
    hints: vec!["Multiply matching components, then add.".into(), "Answer as dot=...".into()],
  }
  .build(rng)
}

fn vector_magnitude(rng: &mut dyn RngCore) -> Question {
  let (a, b): (i64, i64) = (rng.gen_range(1..=9), rng.gen_range(1..=9));
  let m = ((a * a + b * b) as f64).sqrt();
  Draft {
    topic: Topic::Vectors,
    difficulty: 3,
    description: "Find the magnitude of u to two decimal places.".into(),
    equation: format!("u = ({}, {})", a, b),
    steps: vec![format!("|u| = √({}² + {}²) ≈ {:.2}", a, b, m)],
    answers: vec![("magnitude", num(round_to(m, 2)))],
    hints: vec!["Use the Pythagorean theorem.".into(), "Answer as magnitude=...".into()],
  }
  .build(rng)
}

// -------- complex numbers --------

fn complex_pair(rng: &mut dyn RngCore) -> (i64, i64, i64, i64) {
  (rng.gen_range(-7..=7), rng.gen_range(-7..=7), rng.gen_range(-7..=7), rng.gen_range(-7..=7))
}

fn complex_sum(rng: &mut dyn RngCore) -> Question {
  let (a, b, c, d) = complex_pair(rng);
  Draft {
    topic: Topic::Complex,
    difficulty: 1,
    description: "Add the complex numbers.".into(),
    equation: format!("({} {}i) + ({} {}i)", a, signed(b), c, signed(d)),
    steps: vec![format!("= {} {}i", a + c, signed(b + d))],
    answers: vec![("real", num((a + c) as f64)), ("imag", num((b + d) as f64))],
    hints: vec!["Add real parts and imaginary parts separately.".into(), "Answer as real=..., imag=...".into()],
  }
  .build(rng)
}

fn complex_product(rng: &mut dyn RngCore) -> Question {
  let (a, b, c, d) = complex_pair(rng);
  let (re, im) = (a * c - b * d, a * d + b * c);
  Draft {
    topic: Topic::Complex,
    difficulty: 2,
    description: "Multiply the complex numbers.".into(),
    equation: format!("({} {}i)({} {}i)", a, signed(b), c, signed(d)),
    steps: vec!["Expand and use i² = -1.".into(), format!("= {} {}i", re, signed(im))],
    answers: vec![("real", num(re as f64)), ("imag", num(im as f64))],
    hints: vec!["Remember that i² = -1.".into(), "Answer as real=..., imag=...".into()],
  }
  .build(rng)
}

fn complex_modulus(rng: &mut dyn RngCore) -> Question {
  let (a, b): (i64, i64) = (rng.gen_range(1..=9), rng.gen_range(-9..=-1));
  let m = ((a * a + b * b) as f64).sqrt();
  Draft {
    topic: Topic::Complex,
    difficulty: 3,
    description: "Find the modulus |z| to three decimal places.".into(),
    equation: format!("z = {} {}i", a, signed(b)),
    steps: vec![format!("|z| = √({}² + ({})²) ≈ {:.3}", a, b, m)],
    answers: vec![("modulus", dec3(m))],
    hints: vec!["|a + bi| = √(a² + b²)".into(), "Answer as modulus=...".into()],
  }
  .build(rng)
}

// -------- calculus --------

fn quadratic_derivative(rng: &mut dyn RngCore) -> Question {
  let (a, b, c, k): (i64, i64, i64, i64) =
    (rng.gen_range(1..=6), rng.gen_range(-9..=9), rng.gen_range(-9..=9), rng.gen_range(-4..=4));
  let slope = 2 * a * k + b;
  Draft {
    topic: Topic::Calculus,
    difficulty: 1,
    description: format!("Find f'({}).", k),
    equation: format!("f(x) = {}x² {}x {}", a, signed(b), signed(c)),
    steps: vec![format!("f'(x) = {}x {}", 2 * a, signed(b)), format!("f'({}) = {}", k, slope)],
    answers: vec![("x", num(slope as f64))],
    hints: vec!["Differentiate term by term.".into(), "The constant term disappears.".into()],
  }
  .build(rng)
}

fn linear_integral(rng: &mut dyn RngCore) -> Question {
  let (a, b, k): (i64, i64, i64) = (rng.gen_range(1..=6), rng.gen_range(-5..=5), rng.gen_range(1..=5));
  let area = a as f64 * (k * k) as f64 / 2.0 + (b * k) as f64;
  Draft {
    topic: Topic::Calculus,
    difficulty: 2,
    description: "Evaluate the definite integral.".into(),
    equation: format!("∫₀^{} ({}x {}) dx", k, a, signed(b)),
    steps: vec![
      format!("= [{}x²/2 {}x]₀^{}", a, signed(b), k),
      format!("= {}", area),
    ],
    answers: vec![("x", num(area))],
    hints: vec!["Find an antiderivative first.".into(), "Subtract its value at 0.".into()],
  }
  .build(rng)
}

fn cubic_derivative(rng: &mut dyn RngCore) -> Question {
  let (a, b, k): (i64, i64, i64) = (rng.gen_range(1..=4), rng.gen_range(1..=6), rng.gen_range(-3..=3));
  let slope = 3 * a * k * k - 2 * b * k;
  Draft {
    topic: Topic::Calculus,
    difficulty: 3,
    description: format!("Find the slope of the tangent at x = {}.", k),
    equation: format!("f(x) = {}x³ - {}x²", a, b),
    steps: vec![format!("f'(x) = {}x² - {}x", 3 * a, 2 * b), format!("f'({}) = {}", k, slope)],
    answers: vec![("x", num(slope as f64))],
    hints: vec!["Use the power rule on each term.".into(), "Then substitute the x value.".into()],
  }
  .build(rng)
}

// -------- sequences --------

fn arithmetic_term(rng: &mut dyn RngCore) -> Question {
  let (a1, d, n): (i64, i64, i64) = (rng.gen_range(1..=10), rng.gen_range(1..=6), rng.gen_range(5..=15));
  let an = a1 + (n - 1) * d;
  Draft {
    topic: Topic::Sequences,
    difficulty: 1,
    description: format!("Find term number {} of the arithmetic sequence.", n),
    equation: format!("{}, {}, {}, ...", a1, a1 + d, a1 + 2 * d),
    steps: vec![format!("a_n = {} + (n - 1)·{}", a1, d), format!("a_{} = {}", n, an)],
    answers: vec![("x", num(an as f64))],
    hints: vec!["Find the common difference first.".into()],
  }
  .build(rng)
}

fn geometric_term(rng: &mut dyn RngCore) -> Question {
  let (a1, r, n): (i64, i64, u32) = (rng.gen_range(1..=5), rng.gen_range(2..=3), rng.gen_range(3..=7));
  let an = a1 * r.pow(n - 1);
  Draft {
    topic: Topic::Sequences,
    difficulty: 2,
    description: format!("Find term number {} of the geometric sequence.", n),
    equation: format!("{}, {}, {}, ...", a1, a1 * r, a1 * r * r),
    steps: vec![format!("a_n = {}·{}^(n - 1)", a1, r), format!("a_{} = {}", n, an)],
    answers: vec![("x", num(an as f64))],
    hints: vec!["Find the common ratio first.".into()],
  }
  .build(rng)
}

fn arithmetic_sum(rng: &mut dyn RngCore) -> Question {
  let (a1, d, n): (i64, i64, i64) = (rng.gen_range(1..=10), rng.gen_range(1..=5), rng.gen_range(5..=20));
  let sum = n * (2 * a1 + (n - 1) * d) / 2;
  Draft {
    topic: Topic::Sequences,
    difficulty: 3,
    description: format!("Find the sum of the first {} terms.", n),
    equation: format!("{}, {}, {}, ...", a1, a1 + d, a1 + 2 * d),
    steps: vec![format!("S_n = n/2 · (2·{} + (n - 1)·{})", a1, d), format!("S_{} = {}", n, sum)],
    answers: vec![("x", num(sum as f64))],
    hints: vec!["S_n = n/2 · (first + last).".into(), "Find the last term first.".into()],
  }
  .build(rng)
}

// -------- geometry --------

fn rectangle_perimeter(rng: &mut dyn RngCore) -> Question {
  let (w, h): (i64, i64) = (rng.gen_range(2..=20), rng.gen_range(2..=20));
  Draft {
    topic: Topic::Geometry,
    difficulty: 1,
    description: format!("A rectangle is {} by {}. Find its perimeter.", w, h),
    equation: "P = 2(w + h)".into(),
    steps: vec![format!("P = 2({} + {}) = {}", w, h, 2 * (w + h))],
    answers: vec![("perimeter", num((2 * (w + h)) as f64))],
    hints: vec!["Add all four sides.".into(), "Answer as perimeter=...".into()],
  }
  .build(rng)
}

fn rectangle_diagonal(rng: &mut dyn RngCore) -> Question {
  let (w, h): (i64, i64) = (rng.gen_range(2..=15), rng.gen_range(2..=15));
  let diag = ((w * w + h * h) as f64).sqrt();
  Draft {
    topic: Topic::Geometry,
    difficulty: 2,
    description: format!("A rectangle is {} by {}. Find its diagonal to two decimal places.", w, h),
    equation: "d = √(w² + h²)".into(),
    steps: vec![format!("d = √({} + {}) ≈ {:.2}", w * w, h * h, diag)],
    answers: vec![("diagonal", num(round_to(diag, 2)))],
    hints: vec!["The diagonal is the hypotenuse of a right triangle.".into(), "Answer as diagonal=...".into()],
  }
  .build(rng)
}

fn circle_area(rng: &mut dyn RngCore) -> Question {
  let r: i64 = rng.gen_range(1..=12);
  let area = std::f64::consts::PI * (r * r) as f64;
  Draft {
    topic: Topic::Geometry,
    difficulty: 3,
    description: format!("Find the area of a circle with radius {}, to two decimal places.", r),
    equation: "A = πr²".into(),
    steps: vec![format!("A = π·{}² ≈ {:.2}", r, area)],
    answers: vec![("area", num(round_to(area, 2)))],
    hints: vec!["Square the radius before multiplying by π.".into(), "Answer as area=...".into()],
  }
  .build(rng)
}

// -------- probability --------

fn die_at_least(rng: &mut dyn RngCore) -> Question {
  let k: i64 = rng.gen_range(2..=6);
  let p = (7 - k) as f64 / 6.0;
  Draft {
    topic: Topic::Probability,
    difficulty: 1,
    description: format!("A fair die is rolled. What is the probability of rolling at least {}?", k),
    equation: format!("P(X ≥ {})", k),
    steps: vec![format!("{} favourable outcomes out of 6", 7 - k), format!("P ≈ {:.3}", p)],
    answers: vec![("x", dec3(p))],
    hints: vec!["Count the faces that qualify.".into(), "Give a decimal with three places.".into()],
  }
  .build(rng)
}

fn two_dice_sum(rng: &mut dyn RngCore) -> Question {
  let s: i64 = rng.gen_range(2..=12);
  let ways = 6 - (s - 7).abs();
  let p = ways as f64 / 36.0;
  Draft {
    topic: Topic::Probability,
    difficulty: 2,
    description: format!("Two fair dice are rolled. What is the probability that the sum is {}?", s),
    equation: format!("P(sum = {})", s),
    steps: vec![format!("{} of 36 outcomes", ways), format!("P ≈ {:.3}", p)],
    answers: vec![("probability", dec3(p))],
    hints: vec!["List the pairs that reach the sum.".into(), "Answer as probability=...".into()],
  }
  .build(rng)
}

fn draw_two_red(rng: &mut dyn RngCore) -> Question {
  let (red, blue): (i64, i64) = (rng.gen_range(2..=8), rng.gen_range(1..=8));
  let total = red + blue;
  let p = (red * (red - 1)) as f64 / (total * (total - 1)) as f64;
  Draft {
    topic: Topic::Probability,
    difficulty: 3,
    description: format!(
      "A bag holds {} red and {} blue marbles. Two are drawn without replacement. \
       What is the probability both are red?",
      red, blue
    ),
    equation: "P(R₁ ∩ R₂)".into(),
    steps: vec![
      format!("P = {}/{} · {}/{}", red, total, red - 1, total - 1),
      format!("P ≈ {:.3}", p),
    ],
    answers: vec![("probability", dec3(p))],
    hints: vec!["The second draw has one fewer marble.".into(), "Answer as probability=...".into()],
  }
  .build(rng)
}
