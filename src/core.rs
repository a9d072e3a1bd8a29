//! The core library: higher-order helpers written in Haki itself, loaded
//! into the global environment before any user code runs. Everything here
//! relies only on the primitive set; `loop` and `loop-index` are special
//! forms and come from the evaluator directly.

pub const CORE: &str = r#"
(defun map (f xs)
  (if (= xs '())
      '()
      (prepend (f (head xs)) (map f (tail xs)))))

(defun reduce (f a xs)
  (if (= xs '())
      a
      (reduce f (f a (head xs)) (tail xs))))

(defun filter (f xs)
  (if (= xs '())
      xs
      (if (f (head xs))
          (prepend (head xs) (filter f (tail xs)))
          (filter f (tail xs)))))

(defun dec (x)
  (- x 1))

(defun inc (x)
  (+ x 1))

(defun range (x)
  (let (_range (fn (x)
                 (if (= x 0)
                     (list 0)
                     (append (_range (- x 1)) x))))
    (_range (- x 1))))

(defun factorial (n)
  (let (_fact (fn (product n)
                (if (< n 2)
                    product
                    (_fact (* product n) (- n 1)))))
    (_fact 1 n)))

(defun take (x lst)
  (let (_take (fn (accum ls)
                (if (or (= ls '()) (= (count accum) x))
                    accum
                    (_take (append accum (head ls)) (tail ls)))))
    (_take '() lst)))

(defun even? (x)
  (= (mod x 2) 0))

(defun odd? (x)
  (not (even? x)))

(defun words (s)
  (re-split "\s+" s))
"#;
